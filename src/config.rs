//! Flowchart thresholds
//!
//! Every numeric threshold used by the decision flowchart lives here. The
//! defaults reproduce the documented flowchart; a JSON file may override any
//! subset of them.

use serde::{Deserialize, Serialize};

use crate::error::FlowchartError;

/// Nominal grid frequency (Hz)
pub const DEFAULT_NOMINAL_FREQUENCY_HZ: f64 = 50.0;

/// Consecutive disturbed rows before a drift alarm
pub const DEFAULT_DRIFT_ALARM_THRESHOLD: u32 = 20;

/// Open interval `(lower, upper)`; both bounds excluded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenBand {
    pub lower: f64,
    pub upper: f64,
}

impl OpenBand {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// True when `lower < value < upper`
    pub fn contains(&self, value: f64) -> bool {
        self.lower < value && value < self.upper
    }
}

/// Thresholds for the three-step flowchart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowchartConfig {
    /// Frequency that ∆F is measured against (Hz)
    pub nominal_frequency_hz: f64,
    /// Step 2: ∆F values inside this band skip the sign check (Hz)
    pub sign_check_band: OpenBand,
    /// Step 3: row-to-row frequency change considered quiet (Hz)
    pub quiet_frequency_band: OpenBand,
    /// Step 3: rate of change of frequency below which a row is quiet (Hz/s)
    pub max_quiet_rocof_hz_per_sec: f64,
    /// Step 3: ramp magnitude that alarms regardless of ∆F (MW/min)
    pub ramp_limit_mw_per_min: f64,
    /// Step 3: drift counter value at which the drift alarm fires
    pub drift_alarm_threshold: u32,
}

impl Default for FlowchartConfig {
    fn default() -> Self {
        Self {
            nominal_frequency_hz: DEFAULT_NOMINAL_FREQUENCY_HZ,
            sign_check_band: OpenBand::new(-0.10, 0.25),
            quiet_frequency_band: OpenBand::new(-0.10, 0.10),
            max_quiet_rocof_hz_per_sec: 1.0,
            ramp_limit_mw_per_min: 20.0,
            drift_alarm_threshold: DEFAULT_DRIFT_ALARM_THRESHOLD,
        }
    }
}

impl FlowchartConfig {
    /// Check that bands are ordered and limits are usable
    pub fn validate(&self) -> Result<(), FlowchartError> {
        if !(self.nominal_frequency_hz > 0.0) {
            return Err(FlowchartError::ConfigError(format!(
                "nominal_frequency_hz must be positive, got {}",
                self.nominal_frequency_hz
            )));
        }

        for (name, band) in [
            ("sign_check_band", &self.sign_check_band),
            ("quiet_frequency_band", &self.quiet_frequency_band),
        ] {
            if !(band.lower < band.upper) {
                return Err(FlowchartError::ConfigError(format!(
                    "{} lower bound {} must be below upper bound {}",
                    name, band.lower, band.upper
                )));
            }
        }

        if !(self.max_quiet_rocof_hz_per_sec > 0.0) {
            return Err(FlowchartError::ConfigError(
                "max_quiet_rocof_hz_per_sec must be positive".to_string(),
            ));
        }

        if !(self.ramp_limit_mw_per_min > 0.0) {
            return Err(FlowchartError::ConfigError(
                "ramp_limit_mw_per_min must be positive".to_string(),
            ));
        }

        if self.drift_alarm_threshold == 0 {
            return Err(FlowchartError::ConfigError(
                "drift_alarm_threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Load and validate a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, FlowchartError> {
        let config: FlowchartConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, FlowchartError> {
        serde_json::to_string_pretty(self).map_err(|e| FlowchartError::EncodingError(e.to_string()))
    }
}
