//! Compile-time configuration of the node. Pin numbers and timer settings match the
//! ESP32 board the sensor is wired to; secrets are read from `.env` when building for
//! the device (see `.env.example`).

use std::time::Duration;

/// Output that starts a measurement on the rangefinder.
pub const TRIGGER_PIN: usize = 26;
/// Input carrying the echo pulse.
pub const ECHO_PIN: usize = 25;
/// Output switching the rangefinder supply, so it draws nothing while the node sleeps.
pub const SENSOR_POWER_PIN: usize = 27;

/// APB clock feeding the group timers.
pub const APB_CLK_HZ: u64 = 80_000_000;

/// Pulse timer prescaler: one tick per microsecond.
pub const PULSE_TIMER_DIVIDER: u32 = 80;
/// Trigger pulse deadline in pulse timer ticks. Nominal pulse is 10us, the alarm is set
/// lower to absorb the interrupt dispatch overhead. Empirical, tune per silicon.
pub const PULSE_DEADLINE_TICKS: u64 = 2;

/// Echo timer prescaler. 2 is the smallest the group timers accept.
pub const ECHO_TIMER_DIVIDER: u32 = 2;
/// Echo counter frequency, 25ns per tick.
pub const ECHO_TICK_HZ: u64 = APB_CLK_HZ / ECHO_TIMER_DIVIDER as u64;
/// Echo timeout alarm: 15ms, anything further than ~2.5m is treated as no echo.
pub const ECHO_TIMEOUT_TICKS: u64 = 600_000;

/// Speed of sound used for the conversion, in millimeters per second.
pub const SPEED_OF_SOUND_MM_S: u64 = 340_000;

/// Longest wait for the echo to start before the cycle gives up. The hardware timeout
/// only runs once the echo line has risen.
pub const NO_ECHO_GUARD: Duration = Duration::from_millis(100);

/// Time spent in deep sleep between two measurements.
pub const DEEP_SLEEP: Duration = Duration::from_secs(5);

/// Line protocol measurement name and location tag of every record.
pub const MEASUREMENT_NAME: &str = "distance";
pub const LOCATION_TAG: &str = "indoor";

/// Scheme prepended to the InfluxDB token in the `Authorization` header.
pub const INFLUX_AUTH_SCHEME: &str = "Token";

#[cfg(target_os = "espidf")]
mod secrets {
    use dotenvy_macro::dotenv;

    pub const WIFI_SSID: &str = dotenv!("WIFI_SSID");
    pub const WIFI_PASS: &str = dotenv!("WIFI_PASS");
    pub const INFLUX_API_URL: &str = dotenv!("INFLUX_API_URL");
    pub const INFLUX_API_TOKEN: &str = dotenv!("INFLUX_API_TOKEN");
}

#[cfg(not(target_os = "espidf"))]
mod secrets {
    pub const WIFI_SSID: &str = "host-ssid";
    pub const WIFI_PASS: &str = "";
    pub const INFLUX_API_URL: &str =
        "http://localhost:8086/api/v2/write?org=home&bucket=sensors&precision=s";
    pub const INFLUX_API_TOKEN: &str = "host-token";
}

pub use secrets::*;

/// Wifi password as the driver expects it, `None` for open networks.
pub fn wifi_password() -> Option<String> {
    if WIFI_PASS.is_empty() {
        None
    } else {
        Some(WIFI_PASS.to_string())
    }
}
