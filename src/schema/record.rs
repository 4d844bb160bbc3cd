//! Telemetry sample record
//!
//! A lenient, serde-friendly view of one row of an exported telemetry table.
//! Every field is optional so that incomplete rows can be reported or dropped
//! instead of failing the whole table. Field names accept both snake_case and
//! the dashboard's spreadsheet column headers.

use serde::{Deserialize, Serialize};

use crate::timestamp::parse_timestamp;
use crate::types::Sample;

/// Column names required for classification
pub const REQUIRED_COLUMNS: &[&str] = &["Timestamp", "Frequency", "AGC U1", "ULSP U1"];

/// One row of input as parsed from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "Frequency")]
    pub frequency: Option<f64>,
    #[serde(default, alias = "AGC U1", alias = "agc")]
    pub agc_setpoint_before: Option<f64>,
    #[serde(default, alias = "ULSP U1", alias = "ulsp")]
    pub unit_limit_setpoint: Option<f64>,
}

impl SampleRecord {
    pub fn new(timestamp: &str, frequency: f64, agc: f64, limit: f64) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            frequency: Some(frequency),
            agc_setpoint_before: Some(agc),
            unit_limit_setpoint: Some(limit),
        }
    }

    /// Names of required fields that are absent
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.timestamp.as_deref().map_or(true, |t| t.trim().is_empty()) {
            missing.push("timestamp");
        }
        if self.frequency.is_none() {
            missing.push("frequency");
        }
        if self.agc_setpoint_before.is_none() {
            missing.push("agc_setpoint_before");
        }
        if self.unit_limit_setpoint.is_none() {
            missing.push("unit_limit_setpoint");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Validate and convert the record into a sample
    pub fn to_sample(&self) -> Result<Sample, ValidationError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing.join(", ")));
        }

        let raw = self.timestamp.as_deref().unwrap_or_default();
        let timestamp = parse_timestamp(raw)
            .ok_or_else(|| ValidationError::InvalidTimestamp(raw.to_string()))?;

        Ok(Sample::new(
            timestamp,
            self.frequency.unwrap_or_default(),
            self.agc_setpoint_before.unwrap_or_default(),
            self.unit_limit_setpoint.unwrap_or_default(),
        ))
    }

    /// Validate the record schema
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.to_sample().map(|_| ())
    }
}

/// Validation errors for sample records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {0}")]
    MissingFields(String),

    #[error("Unrecognised timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Timestamp goes backwards: {current} follows {previous}")]
    OutOfOrder { previous: String, current: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_spreadsheet_headers() {
        let json = r#"{"Timestamp": "2024-01-15 08:30:00", "Frequency": 49.98, "AGC U1": 210.5, "ULSP U1": 215.0}"#;
        let record: SampleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.frequency, Some(49.98));
        assert_eq!(record.agc_setpoint_before, Some(210.5));
        assert!(record.is_complete());
    }

    #[test]
    fn test_deserialize_snake_case() {
        let json = r#"{"timestamp": "2024-01-15T08:30:00", "frequency": 50.0, "agc_setpoint_before": 1.0, "unit_limit_setpoint": 2.0}"#;
        let record: SampleRecord = serde_json::from_str(json).unwrap();
        let sample = record.to_sample().unwrap();
        assert_eq!(sample.unit_limit_setpoint, 2.0);
    }

    #[test]
    fn test_missing_and_null_fields() {
        let json = r#"{"Timestamp": "2024-01-15 08:30:00", "Frequency": null, "AGC U1": 1.0}"#;
        let record: SampleRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.missing_fields(), vec!["frequency", "unit_limit_setpoint"]);
        assert!(matches!(record.validate(), Err(ValidationError::MissingFields(_))));
    }

    #[test]
    fn test_invalid_timestamp() {
        let record = SampleRecord::new("someday", 50.0, 1.0, 1.0);
        assert_eq!(
            record.validate(),
            Err(ValidationError::InvalidTimestamp("someday".to_string()))
        );
    }
}
