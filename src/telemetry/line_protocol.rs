use std::fmt;

use crate::{config, sensors::Distance};

/// One distance sample in InfluxDB line protocol, e.g. `distance,location=indoor mm=1000.0`.
/// The field is written as a float and no timestamp is sent, so the server stamps it on
/// arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProtocolRecord<'a> {
    measurement: &'a str,
    location: &'a str,
    distance: Distance,
}

impl<'a> LineProtocolRecord<'a> {
    pub fn new(measurement: &'a str, location: &'a str, distance: Distance) -> Self {
        LineProtocolRecord {
            measurement,
            location,
            distance,
        }
    }

    /// Record with the configured measurement name and location tag
    pub fn for_distance(distance: Distance) -> LineProtocolRecord<'static> {
        LineProtocolRecord::new(config::MEASUREMENT_NAME, config::LOCATION_TAG, distance)
    }
}

/// Writes `value` escaping the characters line protocol reserves in that position
fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str, reserved: &[char]) -> fmt::Result {
    for c in value.chars() {
        if reserved.contains(&c) {
            write!(f, "\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

impl fmt::Display for LineProtocolRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, self.measurement, &[',', ' '])?;
        write!(f, ",location=")?;
        write_escaped(f, self.location, &[',', '=', ' '])?;
        write!(f, " mm={}.0", self.distance.millimeters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_record() {
        let record = LineProtocolRecord::for_distance(Distance(1000));
        assert_eq!(record.to_string(), "distance,location=indoor mm=1000.0");
    }

    #[test]
    fn zero_is_a_valid_reading() {
        let record = LineProtocolRecord::for_distance(Distance(0));
        assert_eq!(record.to_string(), "distance,location=indoor mm=0.0");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let record = LineProtocolRecord::new("tank level", "shed,north=1", Distance(12));
        assert_eq!(
            record.to_string(),
            "tank\\ level,location=shed\\,north\\=1 mm=12.0"
        );
    }
}
