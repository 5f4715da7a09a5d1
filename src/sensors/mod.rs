mod distance;
mod echo_timer;
mod hc_sr04;
mod outcome;
mod pulse_timer;

pub use distance::*;
pub use echo_timer::*;
pub use hc_sr04::*;
pub use outcome::*;
pub use pulse_timer::*;
