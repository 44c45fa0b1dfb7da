//! Hardware providers
//!
//! The engine only talks to [`HardwareProvider`]; the Linux hwmon backend and
//! the simulated backend are the two implementations shipped.

mod hardware;
mod provider;
mod simulated;

pub use hardware::{classify_chip, HwmonProvider};
pub use provider::HardwareProvider;
#[cfg(test)]
pub use provider::MockHardwareProvider;
pub use simulated::SimulatedProvider;
