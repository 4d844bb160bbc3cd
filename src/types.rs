//! Core types for the AGC flowchart pipeline
//!
//! This module defines the data structures that flow through each stage of a
//! classification pass: raw samples, derived rows, per-row outcomes and the
//! annotated output rows.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::timestamp;

/// One telemetry sample for a generating unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Sample time (minute granularity, ascending within a table)
    #[serde(with = "timestamp::lenient")]
    pub timestamp: NaiveDateTime,
    /// Measured grid frequency (Hz)
    pub frequency: f64,
    /// AGC setpoint as commanded (MW)
    pub agc_setpoint_before: f64,
    /// Unit limit setpoint (MW)
    pub unit_limit_setpoint: f64,
}

impl Sample {
    pub fn new(
        timestamp: NaiveDateTime,
        frequency: f64,
        agc_setpoint_before: f64,
        unit_limit_setpoint: f64,
    ) -> Self {
        Self {
            timestamp,
            frequency,
            agc_setpoint_before,
            unit_limit_setpoint,
        }
    }
}

/// Quantities derived from a sample, after any perturbation is applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedRow {
    /// Sample time
    #[serde(with = "timestamp::lenient")]
    pub timestamp: NaiveDateTime,
    /// Effective frequency (Hz), including any injected offset
    pub frequency: f64,
    /// AGC setpoint before perturbation (MW)
    pub agc_setpoint_before: f64,
    /// AGC setpoint after perturbation (MW)
    pub agc_setpoint_after: f64,
    /// Unit limit setpoint (MW)
    pub unit_limit_setpoint: f64,
    /// E: setpoint deviation introduced by the perturbation (MW)
    pub setpoint_delta_e: f64,
    /// ∆F: frequency deviation from nominal (Hz)
    pub freq_delta_f: f64,
    /// ∆P: adjusted setpoint minus the unit limit (MW)
    pub power_delta_p: f64,
    /// N = ∆F × ∆P
    pub product_n: f64,
    /// Whether any perturbation offset was applied to this row
    pub perturbed: bool,
}

/// Alarm classification for a single row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmLabel {
    /// No anomaly
    #[default]
    #[serde(rename = "")]
    Clear,
    /// Setpoint tracking fault
    #[serde(rename = "1")]
    SetpointTracking,
    /// Frequency/power sign-consistency fault
    #[serde(rename = "2")]
    SignConsistency,
    /// Sustained unaddressed frequency drift
    #[serde(rename = "3")]
    SustainedDrift,
}

impl AlarmLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmLabel::Clear => "",
            AlarmLabel::SetpointTracking => "1",
            AlarmLabel::SignConsistency => "2",
            AlarmLabel::SustainedDrift => "3",
        }
    }

    pub fn is_alarm(&self) -> bool {
        !matches!(self, AlarmLabel::Clear)
    }
}

impl fmt::Display for AlarmLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flowchart step at which a row's classification was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowchartStep {
    SetpointTracking,
    SignConsistency,
    SustainedDrift,
}

/// Fully classified output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    /// Derived quantities for the row
    #[serde(flatten)]
    pub derived: DerivedRow,
    /// M: AGC ramp rate (MW/min)
    pub ramp_rate: f64,
    /// Final alarm
    pub alarm: AlarmLabel,
    /// Step that produced the alarm
    pub resolved_at: FlowchartStep,
    /// Drift counter after this row
    pub drift_counter: u32,
}

impl AnnotatedRow {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.derived.timestamp
    }
}
