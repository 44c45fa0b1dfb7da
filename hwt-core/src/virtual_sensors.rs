//! Virtual sensor containers
//!
//! A virtual container is a user-defined hardware unit holding user-defined
//! sensors. Nothing probes them; they exist because settings say so:
//!
//! ```text
//! /virtual/<i>/sensorindex       number of sensor slots ever allocated
//! /virtual/<i>/<si>/sensortype   type tag of slot si (absent once deleted)
//! ```
//!
//! Container indices are `0..MAX_VIRTUAL_CONTAINERS` and may have gaps.

use tracing::{debug, info, warn};

use crate::constants::{keys, limits};
use crate::data::{HardwareCategory, HardwareDescriptor, SensorDescriptor, SensorType};
use crate::identifier::Identifier;
use crate::settings::SettingsStore;

/// One user-defined sensor slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualSensor {
    pub index: usize,
    pub sensor_type: SensorType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualSensorContainer {
    index: usize,
    identifier: Identifier,
    sensors: Vec<VirtualSensor>,
}

impl VirtualSensorContainer {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            identifier: container_identifier(index),
            sensors: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn name(&self) -> String {
        format!("Virtual Sensor Container {}", self.index)
    }

    /// Sensors in slot order
    pub fn sensors(&self) -> &[VirtualSensor] {
        &self.sensors
    }

    /// Add a sensor, keeping slot order; an occupied slot is replaced
    pub fn add_sensor(&mut self, sensor: VirtualSensor) {
        match self.sensors.binary_search_by_key(&sensor.index, |s| s.index) {
            Ok(pos) => self.sensors[pos] = sensor,
            Err(pos) => self.sensors.insert(pos, sensor),
        }
    }

    pub fn remove_sensor(&mut self, index: usize) -> Option<VirtualSensor> {
        let pos = self.sensors.iter().position(|s| s.index == index)?;
        Some(self.sensors.remove(pos))
    }

    pub fn sensor_identifier(&self, index: usize) -> Identifier {
        sensor_identifier(self.index, index)
    }

    /// Describe the container the way a provider describes real hardware
    pub fn to_descriptor(&self) -> HardwareDescriptor {
        HardwareDescriptor {
            identifier: self.identifier.clone(),
            name: self.name(),
            category: HardwareCategory::Virtual,
            sensors: self
                .sensors
                .iter()
                .map(|s| SensorDescriptor {
                    identifier: self.sensor_identifier(s.index),
                    name: format!("Virtual Sensor {}", s.index),
                    sensor_type: s.sensor_type,
                    index: s.index,
                })
                .collect(),
            sub_hardware: Vec::new(),
        }
    }
}

/// `/virtual/<i>`
pub fn container_identifier(index: usize) -> Identifier {
    Identifier::trusted([keys::VIRTUAL_ROOT.to_string(), index.to_string()])
}

/// `/virtual/<i>/<si>`
pub fn sensor_identifier(container: usize, sensor: usize) -> Identifier {
    Identifier::trusted([
        keys::VIRTUAL_ROOT.to_string(),
        container.to_string(),
        sensor.to_string(),
    ])
}

pub fn sensor_index_key(container: usize) -> String {
    container_identifier(container).setting_key(keys::SENSOR_INDEX)
}

pub fn sensor_type_key(container: usize, sensor: usize) -> String {
    sensor_identifier(container, sensor).setting_key(keys::SENSOR_TYPE)
}

fn parse_index(segment: &str) -> Option<usize> {
    // canonical decimal only, so "/virtual/01" is not container 1
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}

/// Container index of a `/virtual/<i>` identifier
pub fn parse_container_identifier(id: &Identifier) -> Option<usize> {
    match id.segments() {
        [root, i] if root == keys::VIRTUAL_ROOT => {
            parse_index(i).filter(|i| *i < limits::MAX_VIRTUAL_CONTAINERS)
        }
        _ => None,
    }
}

/// `(container, slot)` of a `/virtual/<i>/<si>` identifier
pub fn parse_sensor_identifier(id: &Identifier) -> Option<(usize, usize)> {
    match id.segments() {
        [root, i, si] if root == keys::VIRTUAL_ROOT => {
            let container = parse_index(i).filter(|i| *i < limits::MAX_VIRTUAL_CONTAINERS)?;
            Some((container, parse_index(si)?))
        }
        _ => None,
    }
}

/// Container index of a descriptor, `None` unless it is a virtual container
pub fn container_index_of(descriptor: &HardwareDescriptor) -> Option<usize> {
    if descriptor.category != HardwareCategory::Virtual {
        return None;
    }
    parse_container_identifier(&descriptor.identifier)
}

/// Number of slots allocated in a container; malformed counters read as 0
pub fn next_sensor_index(settings: &dyn SettingsStore, container: usize) -> usize {
    let key = sensor_index_key(container);
    let Some(raw) = settings.get(&key) else {
        return 0;
    };
    raw.trim().parse::<usize>().unwrap_or_else(|_| {
        warn!(key = %key, value = raw, "Malformed sensor counter, using 0");
        0
    })
}

/// Slot indices below `count` that have a persisted type key, ascending.
///
/// Only keys that exist are visited, so a huge counter costs nothing.
fn persisted_slots(settings: &dyn SettingsStore, container: usize, count: usize) -> Vec<usize> {
    let prefix = format!("{}/", container_identifier(container));
    let suffix = format!("/{}", keys::SENSOR_TYPE);

    let mut slots: Vec<usize> = settings
        .keys_with_prefix(&prefix)
        .iter()
        .filter_map(|key| key.strip_prefix(&prefix)?.strip_suffix(&suffix).and_then(parse_index))
        .filter(|si| *si < count)
        .collect();
    slots.sort_unstable();
    slots.dedup();
    slots
}

/// Rebuild every persisted container, in index order
pub fn load_virtual_containers(settings: &dyn SettingsStore) -> Vec<VirtualSensorContainer> {
    let mut containers = Vec::new();

    for i in 0..limits::MAX_VIRTUAL_CONTAINERS {
        if !settings.contains(&sensor_index_key(i)) {
            continue;
        }

        let mut container = VirtualSensorContainer::new(i);
        for si in persisted_slots(settings, i, next_sensor_index(settings, i)) {
            let Some(raw) = settings.get(&sensor_type_key(i, si)) else {
                continue;
            };
            let sensor_type = SensorType::from_setting(raw);
            if sensor_type.tag().to_string() != raw.trim() {
                warn!(container = i, slot = si, value = raw, fallback = %sensor_type, "Unknown sensor type tag");
            }
            container.add_sensor(VirtualSensor { index: si, sensor_type });
        }

        debug!(container = i, sensors = container.sensors().len(), "Loaded virtual container");
        containers.push(container);
    }

    info!(containers = containers.len(), "Virtual sensor containers loaded");
    containers
}

/// Lowest container index without persisted state
pub fn first_free_index(settings: &dyn SettingsStore) -> Option<usize> {
    (0..limits::MAX_VIRTUAL_CONTAINERS).find(|i| !settings.contains(&sensor_index_key(*i)))
}

pub fn persist_container(settings: &mut dyn SettingsStore, container: usize) {
    settings.set_i64(&sensor_index_key(container), 0);
}

/// Write the type of one sensor slot and raise the container counter past it
pub fn persist_sensor(settings: &mut dyn SettingsStore, container: usize, sensor: VirtualSensor) {
    settings.set_i64(&sensor_type_key(container, sensor.index), sensor.sensor_type.tag());
    let count = next_sensor_index(settings, container).max(sensor.index + 1);
    settings.set_i64(&sensor_index_key(container), count as i64);
}

/// Drop every key of one sensor slot; the counter is left alone so slots are never reused
pub fn purge_sensor(settings: &mut dyn SettingsStore, container: usize, sensor: usize) -> usize {
    settings.remove_prefix(&format!("{}/", sensor_identifier(container, sensor)))
}

/// Drop every key under `/virtual/<i>/`
pub fn purge_container(settings: &mut dyn SettingsStore, container: usize) -> usize {
    settings.remove_prefix(&format!("{}/", container_identifier(container)))
}
