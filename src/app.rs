/*
 * This file is part of hwtree.
 *
 * Copyright (C) 2025 hwtree contributors
 *
 * hwtree is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * hwtree is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with hwtree. If not, see <https://www.gnu.org/licenses/>.
 */


use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use hwt_core::{
    HardwareProvider, HwmonProvider, Identifier, Monitor, MonitorConfig, Node, NodeId, PersistentSettings,
    SensorType, SimulatedProvider, TickReport, TreeRow,
};

pub type DynProvider = Box<dyn HardwareProvider>;
pub type AppMonitor = Monitor<DynProvider, PersistentSettings>;

/// Samples kept per plotted sensor
pub const HISTORY_LEN: usize = 300;

pub const DEFAULT_STATUS: &str = "Ready";

/// Updates between attach and detach of the demo's hot-plugged unit
const DEMO_HOTPLUG_PERIOD: u64 = 30;

/// Load settings from `settings_file` and set up a monitor with virtual
/// containers restored. A missing file marks a first start; an unreadable one
/// is left alone and the session runs on defaults.
pub fn build_monitor(settings_file: &Path, demo: bool) -> AppMonitor {
    let first_start = !settings_file.exists();
    let settings = match PersistentSettings::load(settings_file) {
        Ok(settings) => settings,
        Err(e) => {
            warn!(path = %settings_file.display(), "Ignoring unreadable settings: {}", e);
            PersistentSettings::new()
        }
    };
    let config = MonitorConfig::from_settings(&settings);

    let provider: DynProvider = if demo {
        Box::new(SimulatedProvider::new().with_hotplug(DEMO_HOTPLUG_PERIOD))
    } else {
        Box::new(HwmonProvider::new())
    };

    let mut monitor = Monitor::new(provider, settings, config);
    if first_start {
        monitor.mark_first_start();
    }
    let containers = monitor.load_virtual_containers();
    info!(containers, first_start, demo, "Monitor ready");
    monitor
}

pub struct App {
    pub monitor: AppMonitor,
    /// Rows currently shown in the tree pane
    pub rows: Vec<TreeRow>,
    pub selected: usize,
    /// (tick, value) samples of plotted sensors
    pub history: HashMap<Identifier, VecDeque<(f64, f64)>>,
    pub ticks: u64,
    pub last_refresh: Instant,
    pub status: String,
    /// Type given to the next virtual sensor created with `a`
    pub new_sensor_type: SensorType,
    pub show_rename_popup: bool,
    pub rename_input: String,
}

impl App {
    pub fn new(monitor: AppMonitor) -> Self {
        let mut app = Self {
            monitor,
            rows: Vec::new(),
            selected: 0,
            history: HashMap::new(),
            ticks: 0,
            last_refresh: Instant::now(),
            status: DEFAULT_STATUS.to_string(),
            new_sensor_type: SensorType::Temperature,
            show_rename_popup: false,
            rename_input: String::new(),
        };
        app.rebuild_rows();
        app
    }

    pub fn refresh_interval(&self) -> Duration {
        self.monitor.config().refresh_interval
    }

    /// Run one monitor tick and sample plotted sensors
    pub fn refresh(&mut self) -> TickReport {
        let report = self.monitor.tick();
        self.ticks += 1;
        self.record_history();
        self.rebuild_rows();

        if report.hardware_loaded {
            self.status = format!("Hardware loaded, {} sensors", self.monitor.tree().sensors().len());
        } else if report.attached > 0 || report.removed > 0 {
            self.status = format!("{} unit(s) attached, {} removed", report.attached, report.removed);
        }
        self.last_refresh = Instant::now();
        report
    }

    fn record_history(&mut self) {
        let x = self.ticks as f64;
        let mut plotted = Vec::new();
        for id in self.monitor.plot_colors().selected() {
            let Some(node) = self.monitor.tree().get(*id) else { continue };
            plotted.push(node.identifier.clone());
            let Some(value) = self.monitor.sensor_value(*id) else { continue };
            let samples = self.history.entry(node.identifier.clone()).or_default();
            samples.push_back((x, f64::from(value)));
            while samples.len() > HISTORY_LEN {
                samples.pop_front();
            }
        }
        self.history.retain(|identifier, _| plotted.contains(identifier));
    }

    /// Recompute the row list, keeping the selected node selected when it is still shown
    pub fn rebuild_rows(&mut self) {
        let previous = self.selected_node();
        self.rows = self.monitor.tree().visible_rows(self.monitor.config().show_hidden);
        if let Some(pos) = previous.and_then(|id| self.rows.iter().position(|r| r.id == id)) {
            self.selected = pos;
        }
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    pub fn selected_node(&self) -> Option<NodeId> {
        self.rows.get(self.selected).map(|r| r.id)
    }

    pub fn selected(&self) -> Option<&Node> {
        self.selected_node().and_then(|id| self.monitor.tree().get(id))
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let last = self.rows.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
    }

    /// Show an operation's outcome in the status bar
    pub fn report<T>(&mut self, result: hwt_core::Result<T>, ok: impl FnOnce(T) -> String) {
        self.status = match result {
            Ok(value) => ok(value),
            Err(e) => {
                if !e.is_user_error() {
                    warn!("Action failed: {}", e);
                }
                format!("Error: {}", e)
            }
        };
        self.rebuild_rows();
    }
}
