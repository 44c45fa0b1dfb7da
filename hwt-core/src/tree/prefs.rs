//! Per-node preferences persisted under `<identifier>/<suffix>` keys

use tracing::warn;

use crate::constants::keys;
use crate::data::Color;
use crate::identifier::Identifier;
use crate::settings::SettingsStore;
use crate::tree::model::{Node, NodeKind};

/// Restore what the user last chose for this node
pub fn apply_preferences(node: &mut Node, settings: &dyn SettingsStore) {
    let id = node.identifier.clone();

    node.visible = !settings.get_bool(&id.setting_key(keys::HIDDEN), false);
    if let Some(name) = settings.get(&id.setting_key(keys::NAME)) {
        if !name.trim().is_empty() {
            node.text = name.to_string();
        }
    }

    match &mut node.kind {
        NodeKind::Hardware(_) => {
            node.collapsed = settings.get_bool(&id.setting_key(keys::COLLAPSED), false);
        }
        NodeKind::Sensor(sensor) => {
            sensor.plot = settings.get_bool(&id.setting_key(keys::PLOT), false);
            sensor.overview = settings.get_bool(&id.setting_key(keys::OVERVIEW), false);
            sensor.pen_color = read_pen_color(settings, &id);
        }
        NodeKind::Root => {}
    }
}

fn read_pen_color(settings: &dyn SettingsStore, id: &Identifier) -> Option<Color> {
    let raw = settings.get(&id.setting_key(keys::PEN_COLOR))?;
    match raw.parse() {
        Ok(color) => Some(color),
        Err(e) => {
            warn!(node = %id, value = raw, "Ignoring malformed pen color: {}", e);
            None
        }
    }
}

pub fn store_visible(settings: &mut dyn SettingsStore, id: &Identifier, visible: bool) {
    settings.set_bool(&id.setting_key(keys::HIDDEN), !visible);
}

pub fn store_collapsed(settings: &mut dyn SettingsStore, id: &Identifier, collapsed: bool) {
    settings.set_bool(&id.setting_key(keys::COLLAPSED), collapsed);
}

pub fn store_plot(settings: &mut dyn SettingsStore, id: &Identifier, plot: bool) {
    settings.set_bool(&id.setting_key(keys::PLOT), plot);
}

pub fn store_overview(settings: &mut dyn SettingsStore, id: &Identifier, overview: bool) {
    settings.set_bool(&id.setting_key(keys::OVERVIEW), overview);
}

pub fn store_pen_color(settings: &mut dyn SettingsStore, id: &Identifier, color: Option<Color>) {
    let key = id.setting_key(keys::PEN_COLOR);
    match color {
        Some(c) => settings.set(&key, c.to_string()),
        None => {
            settings.remove(&key);
        }
    }
}

/// Store a rename; `None` or blank restores the provider's name
pub fn store_name(settings: &mut dyn SettingsStore, id: &Identifier, name: Option<&str>) {
    let key = id.setting_key(keys::NAME);
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => settings.set(&key, n.to_string()),
        None => {
            settings.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SensorDescriptor, SensorType};
    use crate::settings::PersistentSettings;

    fn fan_node() -> Node {
        Node::sensor(&SensorDescriptor {
            identifier: Identifier::parse("/lpc/nct6798/fan/1").unwrap(),
            name: "Fan #2".to_string(),
            sensor_type: SensorType::Fan,
            index: 1,
        })
    }

    #[test]
    fn test_defaults_without_settings() {
        let mut node = fan_node();
        apply_preferences(&mut node, &PersistentSettings::new());
        let sensor = node.as_sensor().unwrap();
        assert!(node.visible);
        assert!(!sensor.plot);
        assert!(!sensor.overview);
        assert_eq!(sensor.pen_color, None);
        assert_eq!(node.text, "Fan #2");
    }

    #[test]
    fn test_store_then_apply() {
        let mut settings = PersistentSettings::new();
        let id = Identifier::parse("/lpc/nct6798/fan/1").unwrap();
        store_plot(&mut settings, &id, true);
        store_overview(&mut settings, &id, true);
        store_visible(&mut settings, &id, false);
        store_pen_color(&mut settings, &id, Some(Color::OLIVE));
        store_name(&mut settings, &id, Some("Rear exhaust"));

        let mut node = fan_node();
        apply_preferences(&mut node, &settings);
        let sensor = node.as_sensor().unwrap();
        assert!(!node.visible);
        assert!(sensor.plot);
        assert!(sensor.overview);
        assert_eq!(sensor.pen_color, Some(Color::OLIVE));
        assert_eq!(node.text, "Rear exhaust");
        assert_eq!(node.default_text, "Fan #2");

        store_pen_color(&mut settings, &id, None);
        store_name(&mut settings, &id, Some("   "));
        assert!(!settings.contains("/lpc/nct6798/fan/1/penColor"));
        assert!(!settings.contains("/lpc/nct6798/fan/1/name"));
    }

    #[test]
    fn test_malformed_pen_color_is_ignored() {
        let settings: PersistentSettings =
            [("/lpc/nct6798/fan/1/penColor", "chartreuse")].into_iter().collect();
        let mut node = fan_node();
        apply_preferences(&mut node, &settings);
        assert_eq!(node.as_sensor().unwrap().pen_color, None);
    }
}
