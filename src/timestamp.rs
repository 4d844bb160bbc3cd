//! Timestamp parsing
//!
//! Grid telemetry exports use naive wall-clock timestamps at minute
//! granularity. Parsing is lenient about the separator and precision so that
//! both spreadsheet-style and ISO-style values are accepted.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serializer};

/// Wall-clock formats tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Output format used when serializing timestamps
///
/// Fractional seconds are written only when present.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse a timestamp string, returning `None` when no known format matches.
///
/// RFC 3339 values carrying an offset are converted to UTC wall-clock time.
/// A bare date resolves to midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Format a timestamp for output
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter for `NaiveDateTime` fields using the lenient parser
pub mod lenient {
    use super::*;

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_timestamp(timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_space_separated() {
        let ts = parse_timestamp("2024-03-01 10:15:00").unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.minute(), 15);
    }

    #[test]
    fn test_parse_iso_and_rfc3339() {
        let iso = parse_timestamp("2024-03-01T10:15:00").unwrap();
        let rfc = parse_timestamp("2024-03-01T11:15:00+01:00").unwrap();
        assert_eq!(iso, rfc);
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let ts = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(ts.day(), 1);
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("not a time").is_none());
        assert!(parse_timestamp("2024-13-45 99:00:00").is_none());
    }

    #[test]
    fn test_format_roundtrip() {
        let ts = parse_timestamp("2024-03-01 10:15:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01 10:15:00");
    }

    #[test]
    fn test_format_keeps_fractional_seconds() {
        let millis = parse_timestamp("2024-03-01 10:15:00.250").unwrap();
        assert_eq!(format_timestamp(&millis), "2024-03-01 10:15:00.250");

        let micros = parse_timestamp("2024-03-01 10:15:00.000500").unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(&micros)), Some(micros));
    }
}
