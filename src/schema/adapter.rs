//! Adapter for converting sample records into classifiable samples
//!
//! Handles parsing record batches (JSON array or NDJSON), dropping incomplete
//! rows, and checking that timestamps are in order. The classification pass
//! never sorts, so ordering problems are surfaced here instead.

use crate::error::FlowchartError;
use crate::schema::record::*;
use crate::timestamp::{format_timestamp, parse_timestamp};
use crate::types::Sample;

/// Adapter for converting sample records to samples
pub struct SampleAdapter;

impl SampleAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<SampleRecord>, FlowchartError> {
        let records: Vec<SampleRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<SampleRecord>, FlowchartError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<SampleRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(FlowchartError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Convert records to samples
    ///
    /// Records with a missing field are dropped with a warning. A present but
    /// unparseable timestamp fails the conversion.
    pub fn to_samples(records: &[SampleRecord]) -> Result<Vec<Sample>, FlowchartError> {
        let mut samples = Vec::with_capacity(records.len());
        let mut dropped = 0usize;

        for (idx, record) in records.iter().enumerate() {
            if !record.is_complete() {
                dropped += 1;
                continue;
            }

            match record.to_sample() {
                Ok(sample) => samples.push(sample),
                Err(ValidationError::InvalidTimestamp(raw)) => {
                    return Err(FlowchartError::DateParseError(format!(
                        "record {}: unrecognised timestamp '{}'",
                        idx, raw
                    )));
                }
                Err(e) => {
                    return Err(FlowchartError::ParseError(format!("record {}: {}", idx, e)));
                }
            }
        }

        if dropped > 0 {
            log::warn!(
                "dropped {} of {} records with missing fields",
                dropped,
                records.len()
            );
        }

        Ok(samples)
    }

    /// Validate a batch of records
    ///
    /// Reports missing fields, unparseable timestamps and timestamps that go
    /// backwards relative to the previous valid record.
    pub fn validate_records(records: &[SampleRecord]) -> Vec<ValidationResult> {
        let mut results = Vec::new();
        let mut previous = None;

        for (idx, record) in records.iter().enumerate() {
            let error = match record.validate() {
                Err(e) => Some(e),
                Ok(()) => {
                    let current = record.timestamp.as_deref().and_then(parse_timestamp);
                    let out_of_order = match (previous, current) {
                        (Some(prev), Some(cur)) if cur < prev => {
                            Some(ValidationError::OutOfOrder {
                                previous: format_timestamp(&prev),
                                current: format_timestamp(&cur),
                            })
                        }
                        _ => None,
                    };
                    if current.is_some() {
                        previous = current;
                    }
                    out_of_order
                }
            };

            if let Some(error) = error {
                results.push(ValidationResult {
                    index: idx,
                    timestamp: record.timestamp.clone(),
                    error,
                });
            }
        }

        results
    }
}

/// Problem found in one record
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub index: usize,
    pub timestamp: Option<String>,
    pub error: ValidationError,
}
