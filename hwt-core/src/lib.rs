//! hwtree Core Library
//!
//! Keeps a sensor tree in step with changing hardware, assigns stable plot
//! colors, and restores user-defined virtual sensors from settings.
//!
//! # Features
//!
//! - **Tree Synchronization**: Hardware units are inserted in category order as they attach and dropped as they go away
//! - **Plot Colors**: Plotted sensors keep their palette color while other sensors are toggled
//! - **Overview**: Ordered list of sensors flagged for the overview pane
//! - **Virtual Sensors**: Up to 32 user-defined containers rebuilt from flat settings keys
//! - **Preferences**: Per-node flags persisted and restored on re-attach
//!
//! # Module Structure
//!
//! - `tree/` - Node arena, synchronizer, per-node preferences
//! - `engine/` - Monitor, color assignment, overview selection
//! - `hw/` - Hardware providers (hwmon, simulated)
//! - `data/` - Descriptors, sensor types, colors
//!
//! # Example
//!
//! ```no_run
//! use hwt_core::{Monitor, MonitorConfig, PersistentSettings, SimulatedProvider};
//!
//! let mut monitor = Monitor::new(SimulatedProvider::new(), PersistentSettings::new(), MonitorConfig::default());
//! monitor.load_virtual_containers();
//! let report = monitor.tick();
//! println!("{} units attached, {} in overview", report.attached, monitor.overview().len());
//! ```

// Grouped modules
pub mod data;
pub mod engine;
pub mod hw;
pub mod tree;

// Standalone modules
pub mod constants;
pub mod error;
pub mod identifier;
pub mod settings;
pub mod system;
pub mod virtual_sensors;

pub use data::{
    Color, HardwareCategory, HardwareDescriptor, HardwareEvent, SensorDescriptor, SensorType,
    DEFAULT_PALETTE, MUTED_COLOR,
};
pub use engine::{assign_plot_colors, select_overview, DerivedChanges, Monitor, PlotColors, TickReport};
pub use error::{HwTreeError, Result};
pub use hw::{HardwareProvider, HwmonProvider, SimulatedProvider};
pub use identifier::Identifier;
pub use settings::{get_settings_path, MonitorConfig, PersistentSettings, SettingsStore};
pub use tree::{on_hardware_attached, on_hardware_removed, Node, NodeId, NodeKind, TreeModel, TreeRow};
pub use virtual_sensors::{load_virtual_containers, VirtualSensor, VirtualSensorContainer};
