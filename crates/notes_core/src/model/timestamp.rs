//! Second-precision timestamps shared by every provider.
//!
//! # Responsibility
//! - Normalize backend timestamp text into one totally ordered value.
//! - Render a single stable wire format for callers.
//!
//! # Invariants
//! - Sub-second components are always truncated.
//! - Parsing never fails loudly: unknown text degrades to `None`.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt::{Display, Formatter};

const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// AppSheet returns locale-formatted text (`en-US` => month first).
const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

/// UTC wall-clock time with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Wraps a naive UTC value, dropping sub-second precision.
    pub fn from_naive(value: NaiveDateTime) -> Self {
        Self(value.with_nanosecond(0).unwrap_or(value))
    }

    /// Current UTC time.
    pub fn now() -> Self {
        Self::from_naive(Utc::now().naive_utc())
    }

    /// Builds a timestamp from unix epoch seconds.
    ///
    /// Returns `None` for values outside chrono's representable range.
    pub fn from_epoch_seconds(seconds: i64) -> Option<Self> {
        DateTime::from_timestamp(seconds, 0).map(|value| Self(value.naive_utc()))
    }

    /// Unix epoch seconds for storage.
    pub fn epoch_seconds(&self) -> i64 {
        self.0.and_utc().timestamp()
    }

    /// Parses backend timestamp text.
    ///
    /// Accepts ISO-like naive forms, RFC 3339 (converted to UTC) and the
    /// `MM/DD/YYYY HH:MM:SS` form. Blank or unknown text returns `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        for format in ACCEPTED_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(Self::from_naive(value));
            }
        }

        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|value| Self::from_naive(value.naive_utc()))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp `{raw}`")))
    }
}

/// Lenient optional decoding: `null`, blank and unparseable text become `None`.
pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Timestamp::parse))
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn parse_accepts_iso_and_us_locale_forms() {
        let iso = Timestamp::parse("2026-02-13 10:00:05").expect("iso form should parse");
        let us = Timestamp::parse("02/13/2026 10:00:05").expect("us form should parse");
        let t_form = Timestamp::parse("2026-02-13T10:00:05").expect("T form should parse");
        assert_eq!(iso, us);
        assert_eq!(iso, t_form);
        assert_eq!(iso.to_string(), "2026-02-13 10:00:05");
    }

    #[test]
    fn parse_normalizes_rfc3339_offsets_to_utc() {
        let with_offset =
            Timestamp::parse("2026-02-13T12:00:05+02:00").expect("rfc3339 should parse");
        assert_eq!(with_offset.to_string(), "2026-02-13 10:00:05");
    }

    #[test]
    fn parse_truncates_fractional_seconds() {
        let value = Timestamp::parse("2026-02-13T10:00:05.987").expect("fraction should parse");
        assert_eq!(value.to_string(), "2026-02-13 10:00:05");
    }

    #[test]
    fn parse_degrades_blank_and_garbage_to_none() {
        assert!(Timestamp::parse("").is_none());
        assert!(Timestamp::parse("   ").is_none());
        assert!(Timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn epoch_seconds_round_trip() {
        let value = Timestamp::from_epoch_seconds(1_770_976_805).expect("in range");
        assert_eq!(value.epoch_seconds(), 1_770_976_805);
    }
}
