pub mod http;
pub mod link;
#[cfg(target_os = "espidf")]
pub mod wifi_driver;

pub use link::*;
#[cfg(target_os = "espidf")]
pub use wifi_driver::*;
