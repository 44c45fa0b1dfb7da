//! Data types shared by providers, the tree and the engine

mod types;

pub use types::{
    Color, HardwareCategory, HardwareDescriptor, HardwareEvent, SensorDescriptor, SensorType,
    DEFAULT_PALETTE, MUTED_COLOR,
};
