//! Linux hwmon hardware provider
//!
//! Every `/sys/class/hwmon/hwmonN` chip becomes one hardware unit. Super I/O
//! chips are grouped under a single mainboard unit named after the DMI board.
//!
//! # Sensor files
//!
//! - `tempN_input`: millidegrees Celsius
//! - `inN_input`: millivolts
//! - `fanN_input`: RPM
//! - `powerN_input` / `powerN_average`: microwatts
//! - `pwmN`: duty cycle 0-255, reported as percent

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, info, trace, warn};

use crate::constants::{hwmon, paths};
use crate::data::{HardwareCategory, HardwareDescriptor, HardwareEvent, SensorDescriptor, SensorType};
use crate::error::Result;
use crate::hw::provider::HardwareProvider;
use crate::identifier::Identifier;
use crate::system;

static SENSOR_FILE: OnceLock<Option<Regex>> = OnceLock::new();

fn sensor_file_regex() -> Option<&'static Regex> {
    SENSOR_FILE
        .get_or_init(|| Regex::new(r"^(temp|fan|in|power|pwm)(\d+)(_input|_average)?$").ok())
        .as_ref()
}

/// Map a chip's `name` to the kind of hardware it sits on
pub fn classify_chip(name: &str) -> HardwareCategory {
    let name = name.to_ascii_lowercase();
    let starts = |prefixes: &[&str]| prefixes.iter().any(|p| name.starts_with(p));

    if starts(&["coretemp", "k10temp", "k8temp", "zenpower", "cpu_thermal", "via_cputemp"]) {
        HardwareCategory::Cpu
    } else if starts(&["nct", "it8", "w83", "f71", "f75", "asus", "sch5", "lm78", "lm85"]) {
        HardwareCategory::SuperIo
    } else if starts(&["jc42", "spd5118", "ee1004"]) {
        HardwareCategory::Ram
    } else if starts(&["nouveau", "nvidia"]) {
        HardwareCategory::GpuNvidia
    } else if starts(&["amdgpu", "radeon"]) {
        HardwareCategory::GpuAmd
    } else if starts(&["i915", "xe"]) {
        HardwareCategory::GpuIntel
    } else if starts(&["dell_smm", "thinkpad", "corsair", "nzxt", "aquacomputer", "kraken", "gigabyte_waterforce"]) {
        HardwareCategory::FanController
    } else if starts(&["nvme", "drivetemp"]) {
        HardwareCategory::Storage
    } else if starts(&["r8169", "igb", "ixgbe", "mlx", "bnxt", "atlantic", "iwlwifi", "mt79"]) {
        HardwareCategory::Network
    } else {
        HardwareCategory::Mainboard
    }
}

/// Where a reading comes from and how to turn the raw integer into its unit
#[derive(Debug, Clone)]
struct SensorInput {
    path: PathBuf,
    divisor: f32,
}

impl SensorInput {
    fn read(&self) -> Option<f32> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let value = raw.trim().parse::<i64>().ok()?;
        Some(value as f32 / self.divisor)
    }
}

#[derive(Debug)]
struct ScannedUnit {
    descriptor: HardwareDescriptor,
    inputs: Vec<(Identifier, SensorInput)>,
}

/// Provider backed by the hwmon sysfs tree
#[derive(Debug)]
pub struct HwmonProvider {
    base: PathBuf,
    board_name: String,
    /// Top-level units reported as attached
    known: BTreeMap<Identifier, HardwareDescriptor>,
    inputs: HashMap<Identifier, SensorInput>,
    values: HashMap<Identifier, f32>,
    virtual_units: BTreeMap<Identifier, HardwareDescriptor>,
}

impl HwmonProvider {
    /// Provider for the live system
    pub fn new() -> Self {
        let board = system::read_board_name().unwrap_or_else(|| "Mainboard".to_string());
        Self::with_base(paths::HWMON_BASE, board)
    }

    /// Provider reading chips below `base` instead of `/sys/class/hwmon`
    pub fn with_base(base: impl Into<PathBuf>, board_name: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            board_name: board_name.into(),
            known: BTreeMap::new(),
            inputs: HashMap::new(),
            values: HashMap::new(),
            virtual_units: BTreeMap::new(),
        }
    }

    pub fn registered_virtual(&self) -> impl Iterator<Item = &HardwareDescriptor> {
        self.virtual_units.values()
    }

    fn scan(&self) -> Result<Vec<ScannedUnit>> {
        if !self.base.is_dir() {
            debug!(path = %self.base.display(), "hwmon base not present");
            return Ok(Vec::new());
        }

        let mut chip_paths: Vec<PathBuf> = fs::read_dir(&self.base)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        chip_paths.sort_by_key(|p| hwmon_number(p));

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut top_level = Vec::new();
        let mut super_io = Vec::new();

        for path in chip_paths {
            trace!(path = ?path, "Checking hwmon device");
            let name = chip_name(&path);
            let ordinal = seen.entry(name.clone()).or_insert(0);
            let instance = *ordinal;
            *ordinal += 1;

            match read_hwmon_chip(&path, &name, instance) {
                Ok(Some(unit)) => {
                    debug!(
                        chip = %name,
                        hardware = %unit.descriptor.identifier,
                        sensors = unit.descriptor.sensors.len(),
                        "Found hwmon chip"
                    );
                    if unit.descriptor.category == HardwareCategory::SuperIo {
                        super_io.push(unit);
                    } else {
                        top_level.push(unit);
                    }
                }
                Ok(None) => trace!(path = ?path, "Skipped chip without usable sensors"),
                Err(e) => warn!(path = ?path, "Failed to read hwmon chip: {}", e),
            }
        }

        if !super_io.is_empty() {
            let mut inputs = Vec::new();
            let mut sub_hardware = Vec::new();
            for unit in super_io {
                inputs.extend(unit.inputs);
                sub_hardware.push(unit.descriptor);
            }
            top_level.insert(
                0,
                ScannedUnit {
                    descriptor: HardwareDescriptor {
                        identifier: Identifier::trusted([HardwareCategory::Mainboard.segment()]),
                        name: self.board_name.clone(),
                        category: HardwareCategory::Mainboard,
                        sensors: Vec::new(),
                        sub_hardware,
                    },
                    inputs,
                },
            );
        }

        Ok(top_level)
    }
}

impl Default for HwmonProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareProvider for HwmonProvider {
    fn update(&mut self) -> Vec<HardwareEvent> {
        let scanned = match self.scan() {
            Ok(units) => units,
            Err(e) => {
                warn!("hwmon scan failed, keeping previous topology: {}", e);
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        let current: Vec<Identifier> = scanned.iter().map(|u| u.descriptor.identifier.clone()).collect();

        let gone: Vec<Identifier> = self
            .known
            .keys()
            .filter(|id| !current.contains(id))
            .cloned()
            .collect();
        for id in gone {
            info!(hardware = %id, "hwmon unit disappeared");
            self.known.remove(&id);
            events.push(HardwareEvent::Removed(id));
        }

        self.inputs.clear();
        for unit in scanned {
            self.inputs.extend(unit.inputs);
            let id = unit.descriptor.identifier.clone();
            if !self.known.contains_key(&id) {
                events.push(HardwareEvent::Attached(unit.descriptor.clone()));
                self.known.insert(id, unit.descriptor);
            }
        }

        self.values = self
            .inputs
            .iter()
            .filter_map(|(id, input)| input.read().map(|v| (id.clone(), v)))
            .collect();
        trace!(inputs = self.inputs.len(), readings = self.values.len(), "hwmon sampled");

        events
    }

    fn sensor_value(&self, sensor: &Identifier) -> Option<f32> {
        self.values.get(sensor).copied()
    }

    fn register_virtual(&mut self, container: &HardwareDescriptor) {
        self.virtual_units.insert(container.identifier.clone(), container.clone());
    }

    fn unregister_virtual(&mut self, container: &Identifier) {
        self.virtual_units.remove(container);
    }
}

fn hwmon_number(path: &Path) -> (u32, String) {
    let file = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let number = file.strip_prefix("hwmon").and_then(|n| n.parse().ok()).unwrap_or(u32::MAX);
    (number, file.to_string())
}

fn chip_name(chip_path: &Path) -> String {
    fs::read_to_string(chip_path.join("name"))
        .map(|n| n.trim().to_string())
        .ok()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| {
            chip_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string()
        })
}

fn read_hwmon_chip(chip_path: &Path, name: &str, instance: usize) -> Result<Option<ScannedUnit>> {
    let category = classify_chip(name);
    let segment = name.replace('/', "-");
    let identifier = Identifier::new([category.segment().to_string(), segment, instance.to_string()])?;

    let Some(pattern) = sensor_file_regex() else {
        return Ok(None);
    };

    // (type, channel) -> file, `_input` wins over `_average`
    let mut found: BTreeMap<(i64, usize), (SensorType, String)> = BTreeMap::new();
    for entry in fs::read_dir(chip_path)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        let Some(caps) = pattern.captures(&file_name) else {
            continue;
        };
        let suffix = caps.get(3).map(|m| m.as_str());
        let sensor_type = match (&caps[1], suffix) {
            ("temp", Some("_input")) => SensorType::Temperature,
            ("fan", Some("_input")) => SensorType::Fan,
            ("in", Some("_input")) => SensorType::Voltage,
            ("power", Some(_)) => SensorType::Power,
            ("pwm", None) => SensorType::Control,
            _ => continue,
        };
        let Ok(channel) = caps[2].parse::<usize>() else {
            continue;
        };
        let key = (sensor_type.tag(), channel);
        if suffix == Some("_average") && found.contains_key(&key) {
            continue;
        }
        found.insert(key, (sensor_type, file_name));
    }

    if found.is_empty() {
        return Ok(None);
    }

    let mut sensors = Vec::new();
    let mut inputs = Vec::new();
    for ((_, channel), (sensor_type, file_name)) in found {
        let sensor_id = identifier.child(sensor_type.segment())?.child(channel.to_string())?;
        let prefix = file_name.split('_').next().unwrap_or(&file_name);
        let label = fs::read_to_string(chip_path.join(format!("{prefix}_label")))
            .map(|l| l.trim().to_string())
            .ok()
            .filter(|l| !l.is_empty());

        trace!(sensor = %sensor_id, file = %file_name, "Found sensor");
        sensors.push(SensorDescriptor {
            identifier: sensor_id.clone(),
            name: label.unwrap_or_else(|| format!("{} #{}", sensor_type, channel)),
            sensor_type,
            index: channel,
        });
        inputs.push((
            sensor_id,
            SensorInput {
                path: chip_path.join(&file_name),
                divisor: divisor_for(sensor_type),
            },
        ));
    }

    Ok(Some(ScannedUnit {
        descriptor: HardwareDescriptor {
            identifier,
            name: name.to_string(),
            category,
            sensors,
            sub_hardware: Vec::new(),
        },
        inputs,
    }))
}

fn divisor_for(sensor_type: SensorType) -> f32 {
    match sensor_type {
        SensorType::Temperature | SensorType::Voltage => hwmon::MILLI,
        SensorType::Power => hwmon::MICRO,
        SensorType::Control => hwmon::PWM_MAX / 100.0,
        _ => 1.0,
    }
}
