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


//! Headless mode: tick without a terminal and print the overview as JSON lines

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use hwt_core::{HardwareProvider, Monitor, SettingsStore};

/// One overview row as printed per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewEntry {
    pub identifier: String,
    pub name: String,
    pub hardware: Option<String>,
    pub value: Option<f32>,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickLine {
    pub tick: u64,
    pub overview: Vec<OverviewEntry>,
}

pub fn overview_snapshot<P: HardwareProvider, S: SettingsStore>(monitor: &Monitor<P, S>) -> Vec<OverviewEntry> {
    let tree = monitor.tree();
    monitor
        .overview()
        .iter()
        .filter_map(|id| {
            let node = tree.get(*id)?;
            let sensor = node.as_sensor()?;
            Some(OverviewEntry {
                identifier: node.identifier.to_string(),
                name: node.text.clone(),
                hardware: tree.owning_hardware(*id).and_then(|hw| tree.get(hw)).map(|hw| hw.text.clone()),
                value: monitor.sensor_value(*id),
                unit: sensor.sensor_type.unit(),
            })
        })
        .collect()
}

/// Tick until `shutdown` is set or `max_ticks` ticks ran, writing one JSON
/// line per tick to `out`; settings are saved on the way out
pub fn run_headless<P, S, W>(
    monitor: &mut Monitor<P, S>,
    max_ticks: Option<u64>,
    shutdown: &AtomicBool,
    out: &mut W,
) -> Result<u64>
where
    P: HardwareProvider,
    S: SettingsStore,
    W: Write,
{
    info!(
        interval_ms = monitor.config().refresh_interval.as_millis() as u64,
        "Headless mode started"
    );

    let mut tick = 0u64;
    while !shutdown.load(Ordering::SeqCst) {
        let started = Instant::now();
        let report = monitor.tick();
        tick += 1;
        if report.attached > 0 || report.removed > 0 {
            info!(attached = report.attached, removed = report.removed, "Hardware changed");
        }

        let line = TickLine {
            tick,
            overview: overview_snapshot(monitor),
        };
        let json = serde_json::to_string(&line).context("failed to encode overview")?;
        writeln!(out, "{}", json).context("failed to write overview")?;

        if max_ticks.is_some_and(|max| tick >= max) {
            debug!(ticks = tick, "Tick limit reached");
            break;
        }
        sleep_until_next(started, monitor.config().refresh_interval, shutdown);
    }

    if let Err(e) = monitor.shutdown() {
        warn!("Failed to save settings: {}", e);
        return Err(e.into());
    }
    info!(ticks = tick, "Headless mode stopped");
    Ok(tick)
}

/// Sleep out the rest of the interval in short steps so Ctrl-C is noticed quickly
fn sleep_until_next(started: Instant, interval: Duration, shutdown: &AtomicBool) {
    const STEP: Duration = Duration::from_millis(50);
    while !shutdown.load(Ordering::SeqCst) {
        let remaining = interval.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break;
        }
        thread::sleep(remaining.min(STEP));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hwt_core::{MonitorConfig, PersistentSettings, SimulatedProvider};

    fn monitor() -> Monitor<SimulatedProvider, PersistentSettings> {
        let config = MonitorConfig {
            refresh_interval: Duration::from_millis(hwt_core::constants::timing::MIN_REFRESH_MS),
            ..MonitorConfig::default()
        };
        let mut monitor = Monitor::with_host(SimulatedProvider::new(), PersistentSettings::new(), config, "test");
        monitor.mark_first_start();
        monitor
    }

    #[test]
    fn test_runs_requested_ticks() {
        let mut monitor = monitor();
        let mut out = Vec::new();
        let shutdown = AtomicBool::new(false);

        let ticks = run_headless(&mut monitor, Some(2), &shutdown, &mut out).unwrap();
        assert_eq!(ticks, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["tick"], 2);
        // first start fills the overview with fans and temperatures
        let overview = lines[0]["overview"].as_array().unwrap();
        assert!(!overview.is_empty());
        assert!(overview.iter().all(|e| e["unit"] == "RPM" || e["unit"] == "°C"));
    }

    #[test]
    fn test_stops_when_shutdown_is_set() {
        let mut monitor = monitor();
        let mut out = Vec::new();
        let shutdown = AtomicBool::new(true);

        let ticks = run_headless(&mut monitor, None, &shutdown, &mut out).unwrap();
        assert_eq!(ticks, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_snapshot_empty_before_hardware() {
        let monitor = monitor();
        assert!(overview_snapshot(&monitor).is_empty());
    }
}
