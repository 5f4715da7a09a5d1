#[cfg(target_os = "espidf")]
pub mod microcontroller;
pub mod peripherals;

#[cfg(target_os = "espidf")]
pub use self::microcontroller::{Microcontroller, Rangefinder};
