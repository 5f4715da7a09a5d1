#[cfg(target_os = "espidf")]
mod digital_in;
#[cfg(target_os = "espidf")]
mod digital_out;

#[cfg(target_os = "espidf")]
pub use {digital_in::*, digital_out::*};

/// A digital output whose level can be changed through a shared reference, from the main
/// task as well as from interrupt handlers.
pub trait OutputLine: Send + Sync {
    fn set_level(&self, high: bool);

    fn set_high(&self) {
        self.set_level(true)
    }

    fn set_low(&self) {
        self.set_level(false)
    }
}

/// Errors when configuring a digital output
#[derive(Debug)]
pub enum DigitalOutError {
    CannotSetPinAsOutput,
    InvalidPeripheral(crate::microcontroller_src::peripherals::PeripheralError),
    InvalidPin,
}

/// Errors when configuring a digital input
#[derive(Debug)]
pub enum DigitalInError {
    CannotSetPinAsInput,
    CannotSetPullForPin,
    InvalidPeripheral(crate::microcontroller_src::peripherals::PeripheralError),
    InvalidPin,
    StateAlreadySet,
}
