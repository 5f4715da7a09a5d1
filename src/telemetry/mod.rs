mod line_protocol;
mod publisher;

pub use line_protocol::*;
pub use publisher::*;
