use std::future::Future;

use crate::microcontroller_src::peripherals::PeripheralError;

/// Error types related to WIFI operations.
#[derive(Debug)]
pub enum WifiError {
    ConfigurationError,
    ConnectingError,
    HttpError,
    NvsAlreadyTaken,
    PeripheralError(PeripheralError),
    StartingError,
}

impl From<PeripheralError> for WifiError {
    fn from(value: PeripheralError) -> Self {
        Self::PeripheralError(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    /// Associated with the access point, no address yet
    Connecting,
    Connected,
}

/// The station side of the network link. It only reports on the link: what to do when
/// it goes down is up to the wake cycle.
pub trait ConnectivityGateway {
    /// Brings the link up.
    ///
    /// # Errors
    ///
    /// - `WifiError::ConfigurationError`: If the credentials cannot be applied.
    /// - `WifiError::StartingError`: If the driver cannot be started.
    /// - `WifiError::ConnectingError`: If association or DHCP fails.
    fn connect(&mut self) -> impl Future<Output = Result<(), WifiError>> + '_;

    fn link_state(&self) -> LinkState;

    /// Resolves once the link is lost. Resolves right away if it is already down.
    fn link_lost(&mut self) -> impl Future<Output = ()> + '_;
}
