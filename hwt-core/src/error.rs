//! Error types, re-exported from `hwt-error`

pub use hwt_error::{HwTreeError, Result};
