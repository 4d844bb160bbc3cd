//! Report encoding
//!
//! This module wraps classified rows into a report envelope and renders the
//! rows for export (JSON, NDJSON, CSV).

use crate::error::FlowchartError;
use crate::perturbation::Perturbation;
use crate::summary::AlarmSummary;
use crate::timestamp::format_timestamp;
use crate::types::AnnotatedRow;
use crate::{FLOWCHART_VERSION, PRODUCER_NAME};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Column headers for tabular export
pub const CSV_COLUMNS: &[&str] = &[
    "Timestamp",
    "Frequency",
    "AGC U1",
    "AGC After",
    "∆F",
    "∆P",
    "N",
    "M (MW/min)",
    "Final Alarm",
    "Error",
];

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Classified pass with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    /// Fault injected for this pass, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perturbation: Option<Perturbation>,
    pub summary: AlarmSummary,
    pub rows: Vec<AnnotatedRow>,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Wrap rows into a report
    pub fn encode(
        &self,
        rows: Vec<AnnotatedRow>,
        perturbation: Option<Perturbation>,
    ) -> ClassificationReport {
        ClassificationReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: FLOWCHART_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            perturbation,
            summary: AlarmSummary::from_rows(&rows),
            rows,
        }
    }

    /// Encode a report to JSON
    pub fn to_json(&self, report: &ClassificationReport) -> Result<String, FlowchartError> {
        serde_json::to_string(report).map_err(|e| FlowchartError::EncodingError(e.to_string()))
    }

    /// Encode a report to pretty-printed JSON
    pub fn to_json_pretty(&self, report: &ClassificationReport) -> Result<String, FlowchartError> {
        serde_json::to_string_pretty(report)
            .map_err(|e| FlowchartError::EncodingError(e.to_string()))
    }
}

/// One JSON object per row, newline terminated
pub fn rows_to_ndjson(rows: &[AnnotatedRow]) -> Result<String, FlowchartError> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    Ok(out)
}

/// Tabular export with the dashboard's column layout
pub fn rows_to_csv(rows: &[AnnotatedRow]) -> String {
    let mut out = CSV_COLUMNS.join(",");
    out.push('\n');

    for row in rows {
        let d = &row.derived;
        let fields = [
            format_timestamp(&d.timestamp),
            d.frequency.to_string(),
            d.agc_setpoint_before.to_string(),
            d.agc_setpoint_after.to_string(),
            d.freq_delta_f.to_string(),
            d.power_delta_p.to_string(),
            d.product_n.to_string(),
            row.ramp_rate.to_string(),
            row.alarm.as_str().to_string(),
            d.setpoint_delta_e.to_string(),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}
