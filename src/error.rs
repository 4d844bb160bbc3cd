//! Error types for AGC Flowchart
//!
//! The classification core itself never fails; these errors come from the
//! surfaces around it (record ingestion, configuration, report encoding).

use thiserror::Error;

/// Errors that can occur outside the classification pass
#[derive(Debug, Error)]
pub enum FlowchartError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
