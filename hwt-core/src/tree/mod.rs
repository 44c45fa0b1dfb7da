//! Sensor tree: node arena, topology synchronization, persisted preferences

mod model;
pub mod prefs;
mod sync;

pub use model::{HardwareNode, Node, NodeId, NodeKind, SensorNode, TreeModel, TreeRow};
pub use sync::{on_hardware_attached, on_hardware_removed};
