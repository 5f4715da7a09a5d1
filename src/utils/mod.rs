pub mod delay;
pub mod node_error;
pub mod notification;
pub mod timer_driver;
