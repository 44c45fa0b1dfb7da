//! Persistent settings
//!
//! The engine only consumes the [`SettingsStore`] contract: a flat
//! key → string mapping. [`PersistentSettings`] backs it with a JSON object
//! stored in ~/.config/hwtree/settings.json.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::constants::{keys, paths, timing};
use crate::error::{HwTreeError, Result};

/// Flat key → string store with typed accessors
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str) -> bool;

    /// Remove every key starting with `prefix`, returning how many were removed
    fn remove_prefix(&mut self, prefix: &str) -> usize;

    /// Every key starting with `prefix`, in sorted order
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    fn get_i64(&self, key: &str, default: i64) -> i64 {
        match self.get(key) {
            Some(v) => v.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, value.to_string());
    }

    fn set_i64(&mut self, key: &str, value: i64) {
        self.set(key, value.to_string());
    }

    /// Write pending changes to the backing storage, if there is one
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// JSON-file backed settings
#[derive(Debug, Default, Clone)]
pub struct PersistentSettings {
    values: BTreeMap<String, String>,
    /// File this instance was loaded from; `flush` writes back here
    path: Option<PathBuf>,
}

impl PersistentSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from `path`; a missing file yields empty settings
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, starting empty");
            return Ok(Self {
                values: BTreeMap::new(),
                path: Some(path.to_path_buf()),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| HwTreeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let values: BTreeMap<String, String> = serde_json::from_str(&content)?;
        info!(path = %path.display(), entries = values.len(), "Loaded settings");
        Ok(Self {
            values,
            path: Some(path.to_path_buf()),
        })
    }

    /// Save settings to `path`
    /// Uses atomic write (temp file + rename) to prevent corruption on crash
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| HwTreeError::FileWrite {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&self.values)?;
        let temp_path = path.with_extension("json.tmp");
        let write_err = |source: std::io::Error| HwTreeError::FileWrite {
            path: temp_path.clone(),
            source,
        };

        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        fs::rename(&temp_path, path).map_err(|source| HwTreeError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), entries = self.values.len(), "Saved settings");
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PersistentSettings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            path: None,
        }
    }
}

impl SettingsStore for PersistentSettings {
    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    fn remove_prefix(&mut self, prefix: &str) -> usize {
        let before = self.values.len();
        self.values.retain(|k, _| !k.starts_with(prefix));
        before - self.values.len()
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.values.keys().filter(|k| k.starts_with(prefix)).cloned().collect()
    }

    fn flush(&mut self) -> Result<()> {
        match &self.path {
            Some(path) => self.save(path),
            None => Ok(()),
        }
    }
}

/// Default location of the settings file
pub fn get_settings_path() -> Result<PathBuf> {
    let dir = paths::user_config_dir()
        .ok_or_else(|| HwTreeError::config("Could not determine config directory"))?;
    Ok(dir.join(paths::SETTINGS_FILE))
}

/// Tick and display options kept in the settings store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub refresh_interval: Duration,
    /// Render hidden nodes instead of filtering them out
    pub show_hidden: bool,
    /// Plotting enabled; tree rows are only colored while it is on
    pub show_plot: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(timing::DEFAULT_REFRESH_MS),
            show_hidden: false,
            show_plot: true,
        }
    }
}

impl MonitorConfig {
    pub fn from_settings(settings: &dyn SettingsStore) -> Self {
        let default = Self::default();
        let raw = settings.get_i64(keys::REFRESH_RATE, timing::DEFAULT_REFRESH_MS as i64);
        let ms = clamp_refresh_ms(raw);
        if ms as i64 != raw {
            warn!(requested = raw, applied = ms, "Refresh rate out of range, clamped");
        }
        Self {
            refresh_interval: Duration::from_millis(ms),
            show_hidden: settings.get_bool(keys::SHOW_HIDDEN, default.show_hidden),
            show_plot: settings.get_bool(keys::SHOW_PLOT, default.show_plot),
        }
    }

    pub fn store(&self, settings: &mut dyn SettingsStore) {
        settings.set_i64(keys::REFRESH_RATE, self.refresh_interval.as_millis() as i64);
        settings.set_bool(keys::SHOW_HIDDEN, self.show_hidden);
        settings.set_bool(keys::SHOW_PLOT, self.show_plot);
    }

    /// Change the refresh interval by `delta_ms`, staying within bounds
    pub fn adjust_refresh(&mut self, delta_ms: i64) {
        let current = self.refresh_interval.as_millis() as i64;
        self.refresh_interval = Duration::from_millis(clamp_refresh_ms(current + delta_ms));
    }
}

fn clamp_refresh_ms(ms: i64) -> u64 {
    ms.clamp(timing::MIN_REFRESH_MS as i64, timing::MAX_REFRESH_MS as i64) as u64
}
