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


use hwt_core::constants::timing;
use hwt_core::{NodeId, NodeKind};

use crate::app::App;

fn selected_or_status(app: &mut App) -> Option<NodeId> {
    let id = app.selected_node();
    if id.is_none() {
        app.status = "Nothing selected".to_string();
    }
    id
}

fn selected_sensor(app: &mut App) -> Option<NodeId> {
    let id = selected_or_status(app)?;
    if app.monitor.tree().get(id).is_some_and(|n| n.is_sensor()) {
        Some(id)
    } else {
        app.status = "Select a sensor first".to_string();
        None
    }
}

pub fn toggle_collapsed(app: &mut App) {
    let Some(id) = selected_or_status(app) else { return };
    let Some(node) = app.monitor.tree().get(id) else { return };
    if app.monitor.tree().children(id).is_empty() {
        return;
    }
    let collapsed = !node.collapsed;
    let result = app.monitor.set_collapsed(id, collapsed);
    app.report(result, |_| if collapsed { "Collapsed" } else { "Expanded" }.to_string());
}

pub fn toggle_plot(app: &mut App) {
    let Some(id) = selected_sensor(app) else { return };
    let plot = !app.monitor.tree().get(id).and_then(|n| n.as_sensor()).is_some_and(|s| s.plot);
    let result = app.monitor.set_plot(id, plot);
    app.monitor.refresh_derived();
    app.report(result, |_| if plot { "Plot on" } else { "Plot off" }.to_string());
}

pub fn toggle_overview(app: &mut App) {
    let Some(id) = selected_sensor(app) else { return };
    let overview = !app
        .monitor
        .tree()
        .get(id)
        .and_then(|n| n.as_sensor())
        .is_some_and(|s| s.overview);
    let result = app.monitor.set_overview(id, overview);
    app.monitor.refresh_derived();
    app.report(result, |_| {
        if overview { "Added to overview" } else { "Removed from overview" }.to_string()
    });
}

pub fn toggle_hidden(app: &mut App) {
    let Some(id) = selected_or_status(app) else { return };
    let Some(visible) = app.monitor.tree().get(id).map(|n| n.visible) else { return };
    if matches!(app.monitor.tree().get(id).map(|n| &n.kind), Some(NodeKind::Root)) {
        return;
    }
    let result = app.monitor.set_visible(id, !visible);
    app.report(result, |_| if visible { "Hidden" } else { "Unhidden" }.to_string());
}

pub fn toggle_show_hidden(app: &mut App) {
    let config = app.monitor.config_mut();
    config.show_hidden = !config.show_hidden;
    app.status = if config.show_hidden { "Showing hidden nodes" } else { "Hiding hidden nodes" }.to_string();
    app.rebuild_rows();
}

pub fn toggle_show_plot(app: &mut App) {
    let config = app.monitor.config_mut();
    config.show_plot = !config.show_plot;
    app.status = if config.show_plot { "Plotting on" } else { "Plotting off" }.to_string();
}

pub fn cycle_pen_color(app: &mut App) {
    let Some(id) = selected_sensor(app) else { return };
    let result = app.monitor.cycle_pen_color(id);
    app.monitor.refresh_derived();
    app.report(result, |color| format!("Pen color {}", color));
}

pub fn reset_pen_color(app: &mut App) {
    let Some(id) = selected_sensor(app) else { return };
    let result = app.monitor.set_pen_color(id, None);
    app.monitor.refresh_derived();
    app.report(result, |_| "Pen color reset".to_string());
}

pub fn new_virtual_container(app: &mut App) {
    let result = app.monitor.create_virtual_container();
    app.monitor.refresh_derived();
    let name = result
        .as_ref()
        .ok()
        .and_then(|id| app.monitor.tree().get(*id))
        .map(|n| n.text.clone())
        .unwrap_or_default();
    app.report(result, |_| format!("Created {}", name));
}

/// Add a sensor of the pending type to the selected container, or to the
/// container owning the selected virtual sensor
pub fn add_virtual_sensor(app: &mut App) {
    let Some(id) = selected_or_status(app) else { return };
    let tree = app.monitor.tree();
    let container = if tree.get(id).and_then(|n| n.virtual_index()).is_some() {
        id
    } else {
        tree.parent(id).unwrap_or(id)
    };
    let sensor_type = app.new_sensor_type;
    let result = app.monitor.add_virtual_sensor(container, sensor_type);
    app.monitor.refresh_derived();
    app.report(result, |_| format!("Added {} sensor", sensor_type));
}

pub fn cycle_new_sensor_type(app: &mut App) {
    app.new_sensor_type = app.new_sensor_type.next();
    app.status = format!("New virtual sensors: {}", app.new_sensor_type);
}

pub fn delete_virtual(app: &mut App) {
    let Some(id) = selected_or_status(app) else { return };
    let text = app.monitor.tree().get(id).map(|n| n.text.clone()).unwrap_or_default();
    let result = app.monitor.delete_virtual(id);
    app.monitor.refresh_derived();
    app.report(result, |_| format!("Deleted {}", text));
}

pub fn adjust_refresh(app: &mut App, faster: bool) {
    let step = timing::REFRESH_STEP_MS as i64;
    let config = app.monitor.config_mut();
    config.adjust_refresh(if faster { -step } else { step });
    app.status = format!("Refresh every {} ms", config.refresh_interval.as_millis());
}

pub fn start_rename(app: &mut App) {
    let Some(node) = app.selected() else {
        app.status = "Nothing selected".to_string();
        return;
    };
    app.rename_input = node.text.clone();
    app.show_rename_popup = true;
    app.status = "Rename: Enter to apply, empty restores the default, Esc to cancel".to_string();
}

pub fn apply_rename(app: &mut App) {
    app.show_rename_popup = false;
    let Some(id) = app.selected_node() else { return };
    let input = std::mem::take(&mut app.rename_input);
    let result = app.monitor.rename(id, Some(input.as_str()));
    app.report(result, |_| "Renamed".to_string());
}

pub fn cancel_rename(app: &mut App) {
    app.show_rename_popup = false;
    app.rename_input.clear();
    app.status = "Rename cancelled".to_string();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::loaded_app;
    use hwt_core::SensorType;

    fn select(app: &mut App, id: NodeId) {
        app.selected = app.rows.iter().position(|r| r.id == id).unwrap();
    }

    fn first_sensor(app: &App) -> NodeId {
        app.rows
            .iter()
            .map(|r| r.id)
            .find(|id| app.monitor.tree().get(*id).unwrap().is_sensor())
            .unwrap()
    }

    #[test]
    fn test_plot_toggle_assigns_color() {
        let mut app = loaded_app();
        let sensor = first_sensor(&app);
        select(&mut app, sensor);

        toggle_plot(&mut app);
        assert!(app.monitor.plot_colors().color(sensor).is_some());
        toggle_plot(&mut app);
        assert!(app.monitor.plot_colors().is_empty());
    }

    #[test]
    fn test_plot_on_hardware_row_is_refused() {
        let mut app = loaded_app();
        app.selected = 0;
        toggle_plot(&mut app);
        assert_eq!(app.status, "Select a sensor first");
    }

    #[test]
    fn test_hidden_node_leaves_rows() {
        let mut app = loaded_app();
        let sensor = first_sensor(&app);
        select(&mut app, sensor);
        let before = app.rows.len();

        toggle_hidden(&mut app);
        assert_eq!(app.rows.len(), before - 1);

        toggle_show_hidden(&mut app);
        assert_eq!(app.rows.len(), before);
        assert!(!app.monitor.tree().get(sensor).unwrap().visible);
    }

    #[test]
    fn test_virtual_container_workflow() {
        let mut app = loaded_app();
        new_virtual_container(&mut app);
        assert_eq!(app.status, "Created Virtual Sensor Container 0");

        let container = app.monitor.virtual_containers().next().unwrap().identifier().clone();
        let container_id = app.monitor.tree().lookup(&container).unwrap();
        select(&mut app, container_id);

        cycle_new_sensor_type(&mut app);
        assert_eq!(app.new_sensor_type, SensorType::Temperature.next());
        add_virtual_sensor(&mut app);
        assert_eq!(app.monitor.tree().children(container_id).len(), 1);

        select(&mut app, container_id);
        delete_virtual(&mut app);
        assert!(app.monitor.tree().lookup(&container).is_none());
        assert_eq!(app.monitor.virtual_containers().count(), 0);
    }

    #[test]
    fn test_delete_non_virtual_reports_error() {
        let mut app = loaded_app();
        app.selected = 0;
        delete_virtual(&mut app);
        assert!(app.status.starts_with("Error:"));
    }

    #[test]
    fn test_rename_and_restore() {
        let mut app = loaded_app();
        app.selected = 0;
        let id = app.selected_node().unwrap();
        let original = app.monitor.tree().get(id).unwrap().default_text.clone();

        start_rename(&mut app);
        assert!(app.show_rename_popup);
        app.rename_input = "Board".to_string();
        apply_rename(&mut app);
        assert!(!app.show_rename_popup);
        assert_eq!(app.monitor.tree().get(id).unwrap().text, "Board");

        start_rename(&mut app);
        app.rename_input.clear();
        apply_rename(&mut app);
        assert_eq!(app.monitor.tree().get(id).unwrap().text, original);
    }

    #[test]
    fn test_refresh_interval_steps() {
        let mut app = loaded_app();
        let before = app.refresh_interval();
        adjust_refresh(&mut app, false);
        assert_eq!(
            app.refresh_interval().as_millis(),
            before.as_millis() + timing::REFRESH_STEP_MS as u128
        );
    }
}
