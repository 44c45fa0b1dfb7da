//! Core data types for hwtree
//!
//! Hardware descriptions handed over by providers, the closed sensor-type
//! enumeration, and the colors used for plotting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::identifier::Identifier;

/// Kind of a hardware unit; the declaration order is the sort rank in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HardwareCategory {
    Mainboard,
    SuperIo,
    Cpu,
    Ram,
    GpuNvidia,
    GpuAmd,
    GpuIntel,
    FanController,
    Storage,
    Network,
    Virtual,
}

impl HardwareCategory {
    /// Sort precedence among siblings, lower sorts first
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mainboard => "Mainboard",
            Self::SuperIo => "Super I/O",
            Self::Cpu => "CPU",
            Self::Ram => "Memory",
            Self::GpuNvidia => "NVIDIA GPU",
            Self::GpuAmd => "AMD GPU",
            Self::GpuIntel => "Intel GPU",
            Self::FanController => "Fan Controller",
            Self::Storage => "Storage",
            Self::Network => "Network",
            Self::Virtual => "Virtual",
        }
    }

    /// First identifier segment of units in this category
    pub fn segment(self) -> &'static str {
        match self {
            Self::Mainboard => "mainboard",
            Self::SuperIo => "lpc",
            Self::Cpu => "cpu",
            Self::Ram => "ram",
            Self::GpuNvidia => "gpu-nvidia",
            Self::GpuAmd => "gpu-amd",
            Self::GpuIntel => "gpu-intel",
            Self::FanController => "fancontroller",
            Self::Storage => "hdd",
            Self::Network => "nic",
            Self::Virtual => "virtual",
        }
    }
}

/// Measurement kind of a sensor, persisted as an integer tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    Voltage,
    Clock,
    Temperature,
    Load,
    Fan,
    Flow,
    Control,
    Level,
    Factor,
    Power,
    Data,
    SmallData,
}

impl SensorType {
    /// Used when a persisted tag is missing, malformed or unknown.
    ///
    /// Fan's tag is 4, the value a missing `sensortype` key has always read as,
    /// so settings written with that default keep loading the same type.
    pub const FALLBACK: SensorType = SensorType::Fan;

    pub const ALL: [SensorType; 12] = [
        Self::Voltage,
        Self::Clock,
        Self::Temperature,
        Self::Load,
        Self::Fan,
        Self::Flow,
        Self::Control,
        Self::Level,
        Self::Factor,
        Self::Power,
        Self::Data,
        Self::SmallData,
    ];

    pub fn tag(self) -> i64 {
        self as i64
    }

    pub fn from_tag(tag: i64) -> Option<Self> {
        usize::try_from(tag).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    /// Parse a persisted tag, falling back on anything that is not a known tag
    pub fn from_setting(value: &str) -> Self {
        value
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::from_tag)
            .unwrap_or(Self::FALLBACK)
    }

    /// Next type in tag order, wrapping around
    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    /// Identifier segment used for sensors of this type
    pub fn segment(self) -> &'static str {
        match self {
            Self::Voltage => "voltage",
            Self::Clock => "clock",
            Self::Temperature => "temperature",
            Self::Load => "load",
            Self::Fan => "fan",
            Self::Flow => "flow",
            Self::Control => "control",
            Self::Level => "level",
            Self::Factor => "factor",
            Self::Power => "power",
            Self::Data => "data",
            Self::SmallData => "smalldata",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Voltage => "V",
            Self::Clock => "MHz",
            Self::Temperature => "°C",
            Self::Load | Self::Control | Self::Level => "%",
            Self::Fan => "RPM",
            Self::Flow => "L/h",
            Self::Factor => "",
            Self::Power => "W",
            Self::Data => "GB",
            Self::SmallData => "MB",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 8-bit RGB color, `#rrggbb` in text form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xFF);
    pub const ORANGE_RED: Color = Color::rgb(0xFF, 0x45, 0x00);
    pub const GREEN: Color = Color::rgb(0x00, 0x80, 0x00);
    pub const LIGHT_SEA_GREEN: Color = Color::rgb(0x20, 0xB2, 0xAA);
    pub const GOLDENROD: Color = Color::rgb(0xDA, 0xA5, 0x20);
    pub const DARK_VIOLET: Color = Color::rgb(0x94, 0x00, 0xD3);
    pub const YELLOW_GREEN: Color = Color::rgb(0x9A, 0xCD, 0x32);
    pub const SADDLE_BROWN: Color = Color::rgb(0x8B, 0x45, 0x13);
    pub const ROYAL_BLUE: Color = Color::rgb(0x41, 0x69, 0xE1);
    pub const DEEP_PINK: Color = Color::rgb(0xFF, 0x14, 0x93);
    pub const MEDIUM_SEA_GREEN: Color = Color::rgb(0x3C, 0xB3, 0x71);
    pub const OLIVE: Color = Color::rgb(0x80, 0x80, 0x00);
    pub const FIREBRICK: Color = Color::rgb(0xB2, 0x22, 0x22);
    pub const DARK_GRAY: Color = Color::rgb(0xA9, 0xA9, 0xA9);
}

/// Default plot palette, in assignment order
pub const DEFAULT_PALETTE: [Color; 13] = [
    Color::BLUE,
    Color::ORANGE_RED,
    Color::GREEN,
    Color::LIGHT_SEA_GREEN,
    Color::GOLDENROD,
    Color::DARK_VIOLET,
    Color::YELLOW_GREEN,
    Color::SADDLE_BROWN,
    Color::ROYAL_BLUE,
    Color::DEEP_PINK,
    Color::MEDIUM_SEA_GREEN,
    Color::OLIVE,
    Color::FIREBRICK,
];

/// Text color of hidden rows
pub const MUTED_COLOR: Color = Color::DARK_GRAY;

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color {s:?}, expected #rrggbb"));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

/// A sensor as declared by its hardware unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub identifier: Identifier,
    pub name: String,
    pub sensor_type: SensorType,
    /// Provider-defined index among the unit's sensors of this type
    pub index: usize,
}

/// A hardware unit with its sensors and nested sub-units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareDescriptor {
    pub identifier: Identifier,
    pub name: String,
    pub category: HardwareCategory,
    pub sensors: Vec<SensorDescriptor>,
    pub sub_hardware: Vec<HardwareDescriptor>,
}

impl HardwareDescriptor {
    /// All sensor identifiers of this unit and its sub-units, depth first
    pub fn all_sensor_ids(&self) -> Vec<Identifier> {
        let mut out: Vec<Identifier> = self.sensors.iter().map(|s| s.identifier.clone()).collect();
        for sub in &self.sub_hardware {
            out.extend(sub.all_sensor_ids());
        }
        out
    }
}

/// Topology change reported by a hardware provider
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareEvent {
    Attached(HardwareDescriptor),
    Removed(Identifier),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_rank_order() {
        assert!(HardwareCategory::Mainboard.rank() < HardwareCategory::Cpu.rank());
        assert!(HardwareCategory::Cpu.rank() < HardwareCategory::GpuNvidia.rank());
        assert!(HardwareCategory::Storage.rank() < HardwareCategory::Virtual.rank());
    }

    #[test]
    fn test_sensor_type_tags() {
        assert_eq!(SensorType::from_tag(4), Some(SensorType::Fan));
        assert_eq!(SensorType::from_tag(1), Some(SensorType::Clock));
        assert_eq!(SensorType::from_tag(12), None);
        assert_eq!(SensorType::from_tag(-1), None);
        for t in SensorType::ALL {
            assert_eq!(SensorType::from_tag(t.tag()), Some(t));
        }
    }

    #[test]
    fn test_sensor_type_fallback() {
        assert_eq!(SensorType::from_setting("2"), SensorType::Temperature);
        assert_eq!(SensorType::from_setting(" 9 "), SensorType::Power);
        assert_eq!(SensorType::from_setting("abc"), SensorType::FALLBACK);
        assert_eq!(SensorType::from_setting("99"), SensorType::FALLBACK);
        assert_eq!(SensorType::from_setting(""), SensorType::FALLBACK);
    }

    #[test]
    fn test_sensor_type_next_wraps() {
        assert_eq!(SensorType::Voltage.next(), SensorType::Clock);
        assert_eq!(SensorType::SmallData.next(), SensorType::Voltage);
    }

    #[test]
    fn test_color_text_form() {
        assert_eq!(Color::ORANGE_RED.to_string(), "#ff4500");
        assert_eq!("#FF4500".parse::<Color>().unwrap(), Color::ORANGE_RED);
        assert_eq!("4169e1".parse::<Color>().unwrap(), Color::ROYAL_BLUE);
        assert!("#12345".parse::<Color>().is_err());
        assert!("#zzzzzz".parse::<Color>().is_err());
    }

    #[test]
    fn test_default_palette_is_distinct() {
        for (i, a) in DEFAULT_PALETTE.iter().enumerate() {
            for b in &DEFAULT_PALETTE[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
