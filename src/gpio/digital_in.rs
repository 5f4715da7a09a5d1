use esp_idf_svc::hal::gpio::{AnyIOPin, Input, InterruptType, PinDriver, Pull};
use esp_idf_svc::sys::{esp_err_t, gpio_get_level, gpio_intr_enable, EspError, ESP_ERR_INVALID_STATE};

use super::DigitalInError;
use crate::microcontroller_src::peripherals::Peripheral;

/// Driver for an input pin with pull down, reporting both edges to a callback that runs
/// in interrupt context.
pub struct DigitalIn<'a> {
    pin_driver: PinDriver<'a, AnyIOPin, Input>,
}

fn map_enable_disable_errors(err: EspError) -> DigitalInError {
    match err.code() {
        code if code == ESP_ERR_INVALID_STATE as esp_err_t => DigitalInError::StateAlreadySet,
        _ => DigitalInError::InvalidPin,
    }
}

impl<'a> DigitalIn<'a> {
    /// Creates a new DigitalIn for a pin. Pull is set to down so a disconnected sensor
    /// reads as an idle, low echo line.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::InvalidPeripheral`: If `per` is not a pin or was already taken.
    /// - `DigitalInError::CannotSetPinAsInput`: If the pin does not support input mode.
    /// - `DigitalInError::CannotSetPullForPin`: If the pull down cannot be set.
    pub fn new(per: Peripheral) -> Result<DigitalIn<'a>, DigitalInError> {
        let gpio = per
            .into_any_io_pin()
            .map_err(DigitalInError::InvalidPeripheral)?;
        let mut pin_driver =
            PinDriver::input(gpio).map_err(|_| DigitalInError::CannotSetPinAsInput)?;
        pin_driver
            .set_pull(Pull::Down)
            .map_err(|_| DigitalInError::CannotSetPullForPin)?;
        Ok(DigitalIn { pin_driver })
    }

    /// Calls `callback` on every edge with `true` for a rising edge and `false` for a
    /// falling one. The pin driver disables the interrupt each time it fires, the
    /// subscription enables it again right after the callback so no edge of a short echo
    /// is missed.
    ///
    /// # Errors
    ///
    /// - `DigitalInError::InvalidPin`: If the interrupt type cannot be set.
    /// - `DigitalInError::StateAlreadySet`: If the ISR service is in an invalid state.
    pub fn on_edges<F: FnMut(bool) + Send + 'static>(
        &mut self,
        mut callback: F,
    ) -> Result<(), DigitalInError> {
        let pin = self.pin_driver.pin();
        self.pin_driver
            .set_interrupt_type(InterruptType::AnyEdge)
            .map_err(|_| DigitalInError::InvalidPin)?;

        let edge_callback = move || {
            let rising = unsafe { gpio_get_level(pin) } == 1;
            callback(rising);
            unsafe { gpio_intr_enable(pin) };
        };
        unsafe {
            self.pin_driver
                .subscribe(edge_callback)
                .map_err(map_enable_disable_errors)?;
        }
        self.pin_driver
            .enable_interrupt()
            .map_err(map_enable_disable_errors)
    }
}
