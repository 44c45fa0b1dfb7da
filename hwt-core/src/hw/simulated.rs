//! Simulated hardware for `--demo` and tests
//!
//! Produces a fixed topology with smoothly varying readings. A storage unit
//! can be made to come and go to exercise hot-plug handling.

use std::collections::BTreeMap;

use tracing::debug;

use crate::data::{HardwareCategory, HardwareDescriptor, HardwareEvent, SensorDescriptor, SensorType};
use crate::hw::provider::HardwareProvider;
use crate::identifier::Identifier;

/// Deterministic stand-in for real hardware
#[derive(Debug)]
pub struct SimulatedProvider {
    tick: u64,
    /// Toggle the storage unit every `n` updates
    hotplug_period: Option<u64>,
    started: bool,
    storage_present: bool,
    sensor_types: BTreeMap<Identifier, SensorType>,
    virtual_units: BTreeMap<Identifier, HardwareDescriptor>,
}

fn unit(path: &[&str], name: &str, category: HardwareCategory, sensors: &[(SensorType, usize, &str)]) -> HardwareDescriptor {
    let identifier = Identifier::trusted(path.iter().copied());
    HardwareDescriptor {
        sensors: sensors
            .iter()
            .map(|(sensor_type, index, label)| SensorDescriptor {
                identifier: Identifier::trusted(
                    path.iter()
                        .map(|s| s.to_string())
                        .chain([sensor_type.segment().to_string(), index.to_string()]),
                ),
                name: label.to_string(),
                sensor_type: *sensor_type,
                index: *index,
            })
            .collect(),
        identifier,
        name: name.to_string(),
        category,
        sub_hardware: Vec::new(),
    }
}

fn mainboard() -> HardwareDescriptor {
    let mut board = unit(&["mainboard"], "Simulated Mainboard", HardwareCategory::Mainboard, &[]);
    board.sub_hardware.push(unit(
        &["lpc", "sim6798", "0"],
        "Simulated Super I/O",
        HardwareCategory::SuperIo,
        &[
            (SensorType::Voltage, 0, "Vcore"),
            (SensorType::Voltage, 1, "+12V"),
            (SensorType::Temperature, 1, "System"),
            (SensorType::Temperature, 2, "Chipset"),
            (SensorType::Fan, 1, "CPU Fan"),
            (SensorType::Fan, 2, "Rear Fan"),
            (SensorType::Control, 1, "CPU Fan"),
            (SensorType::Control, 2, "Rear Fan"),
        ],
    ));
    board
}

fn cpu() -> HardwareDescriptor {
    unit(
        &["cpu", "sim", "0"],
        "Simulated CPU",
        HardwareCategory::Cpu,
        &[
            (SensorType::Clock, 0, "Core #1"),
            (SensorType::Clock, 1, "Core #2"),
            (SensorType::Temperature, 0, "Package"),
            (SensorType::Temperature, 1, "Core #1"),
            (SensorType::Temperature, 2, "Core #2"),
            (SensorType::Load, 0, "CPU Total"),
            (SensorType::Power, 0, "Package"),
        ],
    )
}

fn gpu() -> HardwareDescriptor {
    unit(
        &["gpu-amd", "sim", "0"],
        "Simulated Radeon",
        HardwareCategory::GpuAmd,
        &[
            (SensorType::Temperature, 0, "GPU Core"),
            (SensorType::Load, 0, "GPU Core"),
            (SensorType::Fan, 0, "GPU Fan"),
            (SensorType::Power, 0, "GPU Package"),
        ],
    )
}

fn storage() -> HardwareDescriptor {
    unit(
        &["hdd", "sim", "0"],
        "Simulated NVMe",
        HardwareCategory::Storage,
        &[(SensorType::Temperature, 0, "Composite"), (SensorType::Data, 0, "Used Space")],
    )
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self {
            tick: 0,
            hotplug_period: None,
            started: false,
            storage_present: false,
            sensor_types: BTreeMap::new(),
            virtual_units: BTreeMap::new(),
        }
    }

    /// Attach the storage unit after `period` updates, detach it after as many more, and so on
    pub fn with_hotplug(mut self, period: u64) -> Self {
        self.hotplug_period = Some(period.max(1));
        self
    }

    fn remember(&mut self, descriptor: &HardwareDescriptor) {
        for sensor in &descriptor.sensors {
            self.sensor_types.insert(sensor.identifier.clone(), sensor.sensor_type);
        }
        for sub in &descriptor.sub_hardware {
            self.remember(sub);
        }
    }

    fn forget(&mut self, descriptor: &HardwareDescriptor) {
        for id in descriptor.all_sensor_ids() {
            self.sensor_types.remove(&id);
        }
    }

    fn attach(&mut self, descriptor: HardwareDescriptor, events: &mut Vec<HardwareEvent>) {
        self.remember(&descriptor);
        events.push(HardwareEvent::Attached(descriptor));
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn phase(id: &Identifier) -> f32 {
    let hash = id
        .to_string()
        .bytes()
        .fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
    (hash % 628) as f32 / 100.0
}

fn baseline(sensor_type: SensorType) -> (f32, f32) {
    match sensor_type {
        SensorType::Voltage => (1.2, 0.05),
        SensorType::Clock => (3600.0, 400.0),
        SensorType::Temperature => (45.0, 10.0),
        SensorType::Load => (40.0, 30.0),
        SensorType::Fan => (1200.0, 300.0),
        SensorType::Flow => (90.0, 10.0),
        SensorType::Control | SensorType::Level => (50.0, 20.0),
        SensorType::Factor => (1.0, 0.2),
        SensorType::Power => (80.0, 40.0),
        SensorType::Data => (120.0, 0.5),
        SensorType::SmallData => (512.0, 64.0),
    }
}

impl HardwareProvider for SimulatedProvider {
    fn update(&mut self) -> Vec<HardwareEvent> {
        let mut events = Vec::new();

        if !self.started {
            self.started = true;
            self.attach(mainboard(), &mut events);
            self.attach(cpu(), &mut events);
            self.attach(gpu(), &mut events);
        }

        if let Some(period) = self.hotplug_period {
            let want_storage = (self.tick / period) % 2 == 1;
            if want_storage != self.storage_present {
                self.storage_present = want_storage;
                let descriptor = storage();
                if want_storage {
                    self.attach(descriptor, &mut events);
                } else {
                    self.forget(&descriptor);
                    events.push(HardwareEvent::Removed(descriptor.identifier));
                }
                debug!(tick = self.tick, present = want_storage, "Simulated storage toggled");
            }
        }

        self.tick += 1;
        events
    }

    fn sensor_value(&self, sensor: &Identifier) -> Option<f32> {
        let sensor_type = self.sensor_types.get(sensor).copied().or_else(|| {
            self.virtual_units
                .values()
                .flat_map(|c| c.sensors.iter())
                .find(|s| &s.identifier == sensor)
                .map(|s| s.sensor_type)
        })?;
        let (base, amplitude) = baseline(sensor_type);
        Some(base + amplitude * (self.tick as f32 * 0.2 + phase(sensor)).sin())
    }

    fn register_virtual(&mut self, container: &HardwareDescriptor) {
        self.virtual_units.insert(container.identifier.clone(), container.clone());
    }

    fn unregister_virtual(&mut self, container: &Identifier) {
        self.virtual_units.remove(container);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_topology() {
        let mut provider = SimulatedProvider::new();
        let events = provider.update();
        assert_eq!(events.len(), 3);
        assert!(provider.update().is_empty());

        let cpu_temp = Identifier::parse("/cpu/sim/0/temperature/0").unwrap();
        let value = provider.sensor_value(&cpu_temp).unwrap();
        assert!((35.0..=55.0).contains(&value));
        assert!(provider.sensor_value(&Identifier::parse("/cpu/sim/0/fan/9").unwrap()).is_none());
    }

    #[test]
    fn test_hotplug_cycle() {
        let mut provider = SimulatedProvider::new().with_hotplug(2);
        let storage_id = Identifier::parse("/hdd/sim/0").unwrap();

        let mut timeline = Vec::new();
        for _ in 0..6 {
            for event in provider.update() {
                match event {
                    HardwareEvent::Attached(d) if d.identifier == storage_id => timeline.push("attach"),
                    HardwareEvent::Removed(id) if id == storage_id => timeline.push("remove"),
                    _ => {}
                }
            }
        }
        assert_eq!(timeline, vec!["attach", "remove"]);
    }

    #[test]
    fn test_virtual_sensors_have_values() {
        let mut provider = SimulatedProvider::new();
        let mut container = crate::virtual_sensors::VirtualSensorContainer::new(2);
        container.add_sensor(crate::virtual_sensors::VirtualSensor {
            index: 0,
            sensor_type: SensorType::Temperature,
        });
        provider.register_virtual(&container.to_descriptor());

        let id = container.sensor_identifier(0);
        assert!(provider.sensor_value(&id).is_some());
        provider.unregister_virtual(container.identifier());
        assert!(provider.sensor_value(&id).is_none());
    }
}
