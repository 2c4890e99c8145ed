//! Wire formats for timestamps and times of day.
//!
//! The API uses two fixed textual layouts:
//!
//! - full timestamps, always UTC: `YYYY-MM-DDTHH:MM:SSZ`
//! - times of day with no date: `HH:MM:SSZ`
//!
//! The [`instant`], [`time_of_day`] and [`seconds`] modules adapt these to
//! `#[serde(with = "...")]` so entity structs can carry chrono types directly.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

/// Layout used when writing full timestamps.
pub const INSTANT_LAYOUT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Layout used when reading full timestamps. Accepts an optional fractional
/// second, which the server includes on some resources.
const INSTANT_PARSE_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Layout used for times of day.
pub const TIME_OF_DAY_LAYOUT: &str = "%H:%M:%SZ";

/// A time string did not match its expected layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Format error: {input:?} does not match {layout:?}")]
pub struct TimeFormatError {
    /// The rejected input.
    pub input: String,
    /// The layout it was checked against.
    pub layout: &'static str,
    #[source]
    source: chrono::ParseError,
}

/// Format a UTC instant. Sub-second precision is dropped.
#[must_use]
pub fn encode_instant(t: &DateTime<Utc>) -> String {
    t.format(INSTANT_LAYOUT).to_string()
}

/// Parse a UTC instant.
///
/// # Errors
///
/// Returns [`TimeFormatError`] if `s` is not a `YYYY-MM-DDTHH:MM:SSZ` timestamp.
pub fn decode_instant(s: &str) -> Result<DateTime<Utc>, TimeFormatError> {
    NaiveDateTime::parse_from_str(s, INSTANT_PARSE_LAYOUT)
        .map(|naive| naive.and_utc())
        .map_err(|source| TimeFormatError {
            input: s.to_string(),
            layout: INSTANT_LAYOUT,
            source,
        })
}

/// Format a time of day.
#[must_use]
pub fn encode_time_of_day(t: &NaiveTime) -> String {
    t.format(TIME_OF_DAY_LAYOUT).to_string()
}

/// Parse a time of day. Only hour, minute and second are kept.
///
/// # Errors
///
/// Returns [`TimeFormatError`] if `s` is not a `HH:MM:SSZ` time.
pub fn decode_time_of_day(s: &str) -> Result<NaiveTime, TimeFormatError> {
    NaiveTime::parse_from_str(s, TIME_OF_DAY_LAYOUT).map_err(|source| TimeFormatError {
        input: s.to_string(),
        layout: TIME_OF_DAY_LAYOUT,
        source,
    })
}

/// Serde adapter for [`DateTime<Utc>`] fields using the timestamp layout.
pub mod instant {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::missing_errors_doc)]
    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_instant(t))
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::decode_instant(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for [`NaiveTime`] fields using the time-of-day layout.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::missing_errors_doc)]
    pub fn serialize<S: Serializer>(t: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_time_of_day(t))
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::decode_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for [`std::time::Duration`] carried as whole seconds.
pub mod seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::missing_errors_doc)]
    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(d.as_secs())
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_decode_instant() {
        let t = decode_instant("2023-01-15T10:30:00Z").unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2023, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_encode_instant_reproduces_input() {
        let t = decode_instant("2023-01-15T10:30:00Z").unwrap();
        assert_eq!(encode_instant(&t), "2023-01-15T10:30:00Z");
    }

    #[test]
    fn test_decode_instant_with_fraction() {
        let t = decode_instant("2020-05-19T12:37:01.430444Z").unwrap();
        assert_eq!(encode_instant(&t), "2020-05-19T12:37:01Z");
    }

    #[test]
    fn test_decode_instant_rejects_other_layouts() {
        for bad in ["2023-01-15 10:30:00", "2023-01-15T10:30:00+01:00", "10:30:00Z", ""] {
            let err = decode_instant(bad).unwrap_err();
            assert_eq!(err.input, bad);
            assert_eq!(err.layout, INSTANT_LAYOUT);
        }
    }

    #[test]
    fn test_time_of_day() {
        let t = decode_time_of_day("09:05:30Z").unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (9, 5, 30));
        assert_eq!(encode_time_of_day(&t), "09:05:30Z");
    }

    #[test]
    fn test_time_of_day_rejects_timestamp() {
        assert!(decode_time_of_day("2023-01-15T10:30:00Z").is_err());
        assert!(decode_time_of_day("25:00:00Z").is_err());
    }
}
