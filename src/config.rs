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

//! Command line options and file locations

use std::path::{Path, PathBuf};

use clap::Parser;

use hwt_core::constants::paths;
use hwt_core::settings::get_settings_path;

/// Options given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "hwtree")]
#[command(version)]
#[command(about = "hwtree - hardware sensor tree monitor")]
#[command(after_help = "ENVIRONMENT VARIABLES:
    HWTREE_LOG=debug       Log filter (trace, debug, info, warn, error)

FILES:
    ~/.config/hwtree/settings.json     Settings, names and virtual sensors
    ~/.config/hwtree/hwtree.log        Log file written with --logging")]
pub struct CliOptions {
    /// Settings file overriding the default location
    #[arg(long = "settings", value_name = "PATH")]
    pub settings_path: Option<PathBuf>,

    /// Use simulated hardware instead of hwmon
    #[arg(long)]
    pub demo: bool,

    /// Run without the TUI, logging the overview every tick
    #[arg(long)]
    pub headless: bool,

    /// Stop after this many ticks
    #[arg(long, value_name = "N", requires = "headless")]
    pub ticks: Option<u64>,

    /// Write logs to hwtree.log next to the settings file
    #[arg(long)]
    pub logging: bool,
}

impl CliOptions {
    /// Settings file to use: `--settings`, else the per-user default
    pub fn settings_file(&self) -> anyhow::Result<PathBuf> {
        match &self.settings_path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_settings_path()?),
        }
    }
}

/// Log file used by `--logging`, next to the settings file
pub fn log_file_path(settings_file: &Path) -> PathBuf {
    settings_file
        .parent()
        .map(|dir| dir.join(paths::LOG_FILE))
        .unwrap_or_else(|| PathBuf::from(paths::LOG_FILE))
}
