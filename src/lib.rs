pub mod config;
pub mod gpio;
mod microcontroller_src;
pub mod node;
pub mod power;
pub mod sensors;
pub mod telemetry;
pub mod utils;
pub mod wifi;

#[cfg(all(not(target_os = "espidf"), any(test, feature = "sim")))]
pub mod sim;

pub use microcontroller_src::peripherals;
#[cfg(target_os = "espidf")]
pub use microcontroller_src::{Microcontroller, Rangefinder};
pub use utils::timer_driver;
