use esp_idf_svc::hal::gpio::{AnyIOPin, Output, PinDriver};
use esp_idf_svc::sys::gpio_set_level;

use super::{DigitalOutError, OutputLine};
use crate::microcontroller_src::peripherals::Peripheral;

/// Driver owning a pin configured as a push-pull output. The pin starts low.
///
/// Levels are changed through [RawOutputPin] handles, which only hold the pin number
/// and can therefore be moved into interrupt callbacks. The driver itself must outlive
/// them, dropping it resets the pin.
pub struct DigitalOut<'a> {
    pin_driver: PinDriver<'a, AnyIOPin, Output>,
}

/// Copyable handle to a configured output pin.
#[derive(Debug, Clone, Copy)]
pub struct RawOutputPin {
    pin: i32,
}

impl<'a> DigitalOut<'a> {
    /// Creates a new DigitalOut for a pin, driven low.
    ///
    /// # Arguments
    ///
    /// - `per`: A Peripheral capable of transforming into an AnyIOPin.
    ///
    /// # Errors
    ///
    /// - `DigitalOutError::InvalidPeripheral`: If `per` is not a pin or was already taken.
    /// - `DigitalOutError::CannotSetPinAsOutput`: If the pin does not support output mode.
    /// - `DigitalOutError::InvalidPin`: If the initial level cannot be set.
    pub fn new(per: Peripheral) -> Result<DigitalOut<'a>, DigitalOutError> {
        let gpio = per
            .into_any_io_pin()
            .map_err(DigitalOutError::InvalidPeripheral)?;
        let mut pin_driver =
            PinDriver::output(gpio).map_err(|_| DigitalOutError::CannotSetPinAsOutput)?;
        pin_driver
            .set_low()
            .map_err(|_| DigitalOutError::InvalidPin)?;
        Ok(DigitalOut { pin_driver })
    }

    pub fn line(&self) -> RawOutputPin {
        RawOutputPin {
            pin: self.pin_driver.pin(),
        }
    }
}

impl OutputLine for RawOutputPin {
    fn set_level(&self, high: bool) {
        // Only fails for an invalid pin number, which the driver already validated
        unsafe { gpio_set_level(self.pin, high as u32) };
    }
}
