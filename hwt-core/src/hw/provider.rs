//! Hardware provider contract

use crate::data::{HardwareDescriptor, HardwareEvent};
use crate::identifier::Identifier;

/// Source of hardware topology and sensor readings
///
/// The monitor polls `update` once per tick. Events describe top-level units
/// only; nested units travel inside their parent's descriptor.
#[cfg_attr(test, mockall::automock)]
pub trait HardwareProvider {
    /// Refresh readings and report units that appeared or went away since the last call
    fn update(&mut self) -> Vec<HardwareEvent>;

    /// Latest reading of a sensor, in the unit of its sensor type
    fn sensor_value(&self, sensor: &Identifier) -> Option<f32>;

    /// Make a virtual container part of the update cycle, replacing any
    /// earlier registration with the same identifier
    fn register_virtual(&mut self, container: &HardwareDescriptor);

    fn unregister_virtual(&mut self, container: &Identifier);
}

impl<T: HardwareProvider + ?Sized> HardwareProvider for Box<T> {
    fn update(&mut self) -> Vec<HardwareEvent> {
        (**self).update()
    }

    fn sensor_value(&self, sensor: &Identifier) -> Option<f32> {
        (**self).sensor_value(sensor)
    }

    fn register_virtual(&mut self, container: &HardwareDescriptor) {
        (**self).register_virtual(container)
    }

    fn unregister_virtual(&mut self, container: &Identifier) {
        (**self).unregister_virtual(container)
    }
}
