use std::future::Future;

use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem,
    nvs::EspDefaultNvsPartition,
    timer::EspTaskTimerService,
    wifi::{AsyncWifi, AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

use super::{
    http::HttpClient,
    link::{ConnectivityGateway, LinkState, WifiError},
};
use crate::config;

/// Abstraction of the driver that controls the wifi station. Credentials come from the
/// build configuration.
pub struct WifiDriver<'a> {
    controller: AsyncWifi<EspWifi<'a>>,
}

impl<'a> WifiDriver<'a> {
    /// Creates a new WifiDriver.
    ///
    /// Takes the Non-Volatile Storage of the ESP so the driver can cache calibration data,
    /// which shortens reconnects after every wake up.
    ///
    /// # Arguments
    ///
    /// - `event_loop`: Microcontroller's event loop.
    /// - `timer_service`: Task timer service shared with the rest of the node.
    /// - `modem`: Microcontroller's modem peripheral.
    ///
    /// # Errors
    ///
    /// - `WifiError::NvsAlreadyTaken`: If the NVS Default Partition was already taken.
    /// - `WifiError::StartingError`: If there is an error initializing the driver.
    pub fn new(
        event_loop: EspSystemEventLoop,
        timer_service: EspTaskTimerService,
        modem: modem::Modem,
    ) -> Result<Self, WifiError> {
        let nvs = EspDefaultNvsPartition::take().map_err(|_| WifiError::NvsAlreadyTaken)?;
        let wifi = EspWifi::new(modem, event_loop.clone(), Some(nvs))
            .map_err(|_| WifiError::StartingError)?;
        let controller = AsyncWifi::wrap(wifi, event_loop, timer_service)
            .map_err(|_| WifiError::StartingError)?;
        Ok(WifiDriver { controller })
    }

    fn client_configuration() -> Result<Configuration, WifiError> {
        let (auth_method, password) = match config::wifi_password() {
            Some(pass) => (AuthMethod::WPAWPA2Personal, pass),
            None => (AuthMethod::None, String::new()),
        };
        Ok(Configuration::Client(ClientConfiguration {
            ssid: config::WIFI_SSID
                .try_into()
                .map_err(|_| WifiError::ConfigurationError)?,
            bssid: None,
            auth_method,
            password: password
                .as_str()
                .try_into()
                .map_err(|_| WifiError::ConfigurationError)?,
            channel: None,
            ..Default::default()
        }))
    }

    /// Creates a new HttpClient ready to use.
    ///
    /// # Errors
    ///
    /// - `WifiError::HttpError`: If the inizialization of the HttpClient fails.
    pub fn get_http_client(&self) -> Result<HttpClient, WifiError> {
        HttpClient::new().map_err(|_| WifiError::HttpError)
    }
}

impl ConnectivityGateway for WifiDriver<'_> {
    fn connect(&mut self) -> impl Future<Output = Result<(), WifiError>> + '_ {
        async move {
            let wifi_configuration = Self::client_configuration()?;
            self.controller
                .set_configuration(&wifi_configuration)
                .map_err(|_| WifiError::ConfigurationError)?;

            log::info!("Starting Wi-Fi driver");
            self.controller
                .start()
                .await
                .map_err(|_| WifiError::StartingError)?;

            log::info!("Connecting to {}", config::WIFI_SSID);
            self.controller
                .connect()
                .await
                .map_err(|_| WifiError::ConnectingError)?;

            self.controller
                .wait_netif_up()
                .await
                .map_err(|_| WifiError::ConnectingError)?;

            if let Ok(info) = self.controller.wifi().sta_netif().get_ip_info() {
                log::info!("Station up with address {}", info.ip);
            }
            Ok(())
        }
    }

    fn link_state(&self) -> LinkState {
        match (self.controller.is_connected(), self.controller.is_up()) {
            (_, Ok(true)) => LinkState::Connected,
            (Ok(true), _) => LinkState::Connecting,
            _ => LinkState::Disconnected,
        }
    }

    fn link_lost(&mut self) -> impl Future<Output = ()> + '_ {
        async move {
            // Waits for as long as the station stays up
            if self
                .controller
                .wifi_wait(|wifi| wifi.is_up(), None)
                .await
                .is_err()
            {
                log::warn!("Could not watch the Wi-Fi link, treating it as lost");
            }
        }
    }
}
