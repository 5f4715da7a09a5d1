use crate::{
    gpio::{DigitalInError, DigitalOutError},
    microcontroller_src::peripherals::PeripheralError,
    utils::timer_driver::TimerDriverError,
    wifi::WifiError,
};

/// Anything that can go wrong while bringing the board up
#[derive(Debug)]
pub enum NodeError {
    DigitalInError(DigitalInError),
    DigitalOutError(DigitalOutError),
    PeripheralError(PeripheralError),
    SystemServiceUnavailable,
    TimerDriverError(TimerDriverError),
    WifiError(WifiError),
}

impl From<DigitalInError> for NodeError {
    fn from(value: DigitalInError) -> Self {
        Self::DigitalInError(value)
    }
}

impl From<DigitalOutError> for NodeError {
    fn from(value: DigitalOutError) -> Self {
        Self::DigitalOutError(value)
    }
}

impl From<PeripheralError> for NodeError {
    fn from(value: PeripheralError) -> Self {
        Self::PeripheralError(value)
    }
}

impl From<TimerDriverError> for NodeError {
    fn from(value: TimerDriverError) -> Self {
        Self::TimerDriverError(value)
    }
}

impl From<WifiError> for NodeError {
    fn from(value: WifiError) -> Self {
        Self::WifiError(value)
    }
}
