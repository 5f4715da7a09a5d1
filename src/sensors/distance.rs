use std::fmt;

use super::outcome::RawTickCount;
use crate::config::{ECHO_TICK_HZ, SPEED_OF_SOUND_MM_S};

/// Echo ticks per millimeter of distance: the echo covers the distance twice, so
/// `2 * ECHO_TICK_HZ / SPEED_OF_SOUND_MM_S`, rounded up. 236 at 40MHz and 340m/s.
pub const TICKS_PER_MM: u64 = (2 * ECHO_TICK_HZ + SPEED_OF_SOUND_MM_S - 1) / SPEED_OF_SOUND_MM_S;

const _: () = assert!(TICKS_PER_MM > 0);

/// Distance to the target in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Distance(pub u32);

impl Distance {
    pub fn millimeters(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mm", self.0)
    }
}

/// Converts an echo duration into a distance. Floor division, so every millimeter spans
/// [TICKS_PER_MM] ticks and echoes shorter than that read as 0mm.
pub fn estimate_distance(ticks: RawTickCount) -> Distance {
    Distance((ticks.0 as u64 / TICKS_PER_MM) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ECHO_TIMEOUT_TICKS;

    #[test]
    fn calibration_matches_the_board() {
        assert_eq!(TICKS_PER_MM, 236);
    }

    #[test]
    fn one_meter() {
        assert_eq!(estimate_distance(RawTickCount(236_000)), Distance(1000));
    }

    #[test]
    fn quantization_step_is_one_millimeter_per_236_ticks() {
        assert_eq!(estimate_distance(RawTickCount(0)), Distance(0));
        assert_eq!(estimate_distance(RawTickCount(235)), Distance(0));
        assert_eq!(estimate_distance(RawTickCount(236)), Distance(1));
        assert_eq!(estimate_distance(RawTickCount(471)), Distance(1));
        assert_eq!(estimate_distance(RawTickCount(472)), Distance(2));
    }

    #[test]
    fn monotonic_up_to_the_timeout() {
        let mut previous = Distance(0);
        for ticks in 0..=ECHO_TIMEOUT_TICKS as u32 {
            let distance = estimate_distance(RawTickCount(ticks));
            assert!(distance >= previous, "{ticks} ticks went backwards");
            previous = distance;
        }
        assert_eq!(previous, Distance(2542));
    }

    #[test]
    fn largest_count_does_not_wrap() {
        assert_eq!(
            estimate_distance(RawTickCount(u32::MAX)),
            Distance(u32::MAX / 236)
        );
    }
}
