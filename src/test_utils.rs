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


//! Test utilities shared by the unit tests of this crate

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hwt_core::{Monitor, MonitorConfig, PersistentSettings, SimulatedProvider};

use crate::app::{App, DynProvider};

/// App over the simulated provider, before its first refresh
pub fn demo_app() -> App {
    let provider: DynProvider = Box::new(SimulatedProvider::new());
    let monitor = Monitor::with_host(provider, PersistentSettings::new(), MonitorConfig::default(), "test");
    App::new(monitor)
}

/// App over the simulated provider with its hardware already attached
pub fn loaded_app() -> App {
    let mut app = demo_app();
    app.refresh();
    app
}

/// Write a settings file holding `entries` into `dir`
pub fn write_settings(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let map: BTreeMap<&str, &str> = entries.iter().copied().collect();
    let path = dir.join("settings.json");
    std::fs::write(&path, serde_json::to_string_pretty(&map).unwrap()).unwrap();
    path
}
