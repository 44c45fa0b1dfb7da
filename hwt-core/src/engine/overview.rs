//! Overview selection

use crate::data::{HardwareCategory, SensorType};
use crate::tree::{NodeId, TreeModel};

/// Sensor types flagged for the overview on first start
pub const AUTO_OVERVIEW_TYPES: [SensorType; 2] = [SensorType::Fan, SensorType::Temperature];

/// Every overview-flagged sensor, in tree order
pub fn select_overview(tree: &TreeModel) -> Vec<NodeId> {
    tree.sensors()
        .into_iter()
        .filter(|id| {
            tree.get(*id)
                .and_then(|n| n.as_sensor())
                .is_some_and(|s| s.overview)
        })
        .collect()
}

/// Sensors that a first start puts into the overview
pub fn auto_overview_candidates(tree: &TreeModel) -> Vec<NodeId> {
    tree.sensors()
        .into_iter()
        .filter(|id| {
            tree.get(*id)
                .and_then(|n| n.as_sensor())
                .is_some_and(|s| AUTO_OVERVIEW_TYPES.contains(&s.sensor_type))
        })
        .collect()
}

/// Storage temperature sensors, in tree order; a first start names them `HDD0`, `HDD1`, ...
pub fn auto_name_candidates(tree: &TreeModel) -> Vec<NodeId> {
    tree.sensors()
        .into_iter()
        .filter(|id| {
            let is_temperature = tree
                .get(*id)
                .and_then(|n| n.as_sensor())
                .is_some_and(|s| s.sensor_type == SensorType::Temperature);
            is_temperature
                && tree
                    .owning_hardware(*id)
                    .and_then(|hw| tree.get(hw))
                    .and_then(|n| n.category())
                    == Some(HardwareCategory::Storage)
        })
        .collect()
}
