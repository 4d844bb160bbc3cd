//! Three-step decision flowchart
//!
//! Each row is evaluated against three checks in order, stopping at the first
//! one that settles it:
//!
//! 1. **Setpoint tracking**: any difference between the commanded and the
//!    effective AGC setpoint raises alarm `1`.
//! 2. **Sign consistency**: when ∆F is outside the tolerated band, the sign of
//!    N = ∆F × ∆P decides between alarm `2` and falling through.
//! 3. **Sustained drift**: the AGC ramp rate is computed against the previous
//!    row. A non-zero ramp alarms when it is steep or pushes in the wrong
//!    direction for the frequency deviation. A flat ramp feeds the drift
//!    tracker, which alarms `3` once frequency has been disturbed for long
//!    enough.
//!
//! The classifier is a pure function of its input; the drift tracker is passed
//! in by value and the updated tracker is returned in the outcome.

use crate::config::FlowchartConfig;
use crate::hysteresis::DriftTracker;
use crate::types::{AlarmLabel, DerivedRow, FlowchartStep};

/// Everything the flowchart needs to classify one row
#[derive(Debug, Clone, Copy)]
pub struct StepInput<'a> {
    /// Row being classified
    pub current: &'a DerivedRow,
    /// Previous row in the pass, `None` for the first row
    pub previous: Option<&'a DerivedRow>,
    /// Drift tracker state after the previous row
    pub tracker: DriftTracker,
    /// Ramp rate reported for the previous row (MW/min)
    pub previous_ramp_rate: f64,
}

/// Result of classifying one row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub label: AlarmLabel,
    /// Tracker state to carry into the next row
    pub tracker: DriftTracker,
    /// Ramp rate to report for this row (MW/min)
    pub ramp_rate: f64,
    pub resolved_at: FlowchartStep,
}

/// Elapsed time between two consecutive rows
#[derive(Debug, Clone, Copy, PartialEq)]
struct Elapsed {
    minutes: f64,
    seconds: f64,
}

impl Elapsed {
    fn between(previous: &DerivedRow, current: &DerivedRow) -> Self {
        let delta = current.timestamp - previous.timestamp;
        let seconds = match delta.num_microseconds() {
            Some(micros) => micros as f64 / 1_000_000.0,
            // Spans too long for microsecond precision
            None => delta.num_milliseconds() as f64 / 1_000.0,
        };
        Self {
            minutes: seconds / 60.0,
            seconds,
        }
    }
}

/// Outcome of Step 2
enum SignCheck {
    Alarm,
    FallThrough,
}

/// Flowchart evaluator bound to a set of thresholds
pub struct StepClassifier<'a> {
    config: &'a FlowchartConfig,
}

impl<'a> StepClassifier<'a> {
    pub fn new(config: &'a FlowchartConfig) -> Self {
        Self { config }
    }

    /// Classify one row
    pub fn classify(&self, input: StepInput<'_>) -> StepOutcome {
        let row = input.current;

        // Step 1: exact comparison; any deviation counts
        if row.setpoint_delta_e.abs() > 0.0 {
            return Self::settled_early(
                AlarmLabel::SetpointTracking,
                FlowchartStep::SetpointTracking,
                &input,
            );
        }

        if let SignCheck::Alarm = self.check_sign_consistency(row) {
            return Self::settled_early(
                AlarmLabel::SignConsistency,
                FlowchartStep::SignConsistency,
                &input,
            );
        }

        self.check_sustained_drift(&input)
    }

    /// Steps 1 and 2 freeze the ramp rate and leave the tracker alone
    fn settled_early(
        label: AlarmLabel,
        step: FlowchartStep,
        input: &StepInput<'_>,
    ) -> StepOutcome {
        StepOutcome {
            label,
            tracker: input.tracker,
            ramp_rate: input.previous_ramp_rate,
            resolved_at: step,
        }
    }

    fn check_sign_consistency(&self, row: &DerivedRow) -> SignCheck {
        if self.config.sign_check_band.contains(row.freq_delta_f) {
            return SignCheck::FallThrough;
        }

        let n = row.product_n;
        if n > 0.0 {
            SignCheck::Alarm
        } else if n < 0.0 {
            SignCheck::FallThrough
        } else if n == 0.0 && row.power_delta_p == 0.0 {
            SignCheck::FallThrough
        } else {
            SignCheck::Alarm
        }
    }

    fn check_sustained_drift(&self, input: &StepInput<'_>) -> StepOutcome {
        let row = input.current;
        let elapsed = input.previous.map(|prev| Elapsed::between(prev, row));

        let ramp_rate = match elapsed {
            Some(elapsed) if elapsed.minutes != 0.0 => {
                (row.agc_setpoint_before - row.agc_setpoint_after) / elapsed.minutes
            }
            _ => 0.0,
        };

        let limit = self.config.ramp_limit_mw_per_min;
        let mut tracker = input.tracker;

        let label = if ramp_rate == 0.0 {
            let (delta_f, rocof) = match (input.previous, elapsed) {
                (Some(prev), Some(elapsed)) => {
                    let delta_f = row.frequency - prev.frequency;
                    let rocof = if elapsed.seconds > 0.0 {
                        delta_f.abs() / elapsed.seconds
                    } else {
                        0.0
                    };
                    (delta_f, rocof)
                }
                _ => (0.0, 0.0),
            };

            let quiet = self.config.quiet_frequency_band.contains(delta_f)
                && rocof < self.config.max_quiet_rocof_hz_per_sec;

            if quiet {
                tracker = tracker.record_quiet();
                AlarmLabel::Clear
            } else {
                tracker = tracker.record_disturbed();
                if tracker.is_sustained() {
                    AlarmLabel::SustainedDrift
                } else {
                    AlarmLabel::Clear
                }
            }
        } else if ramp_rate > 0.0 {
            if ramp_rate > limit || row.freq_delta_f > 0.0 {
                AlarmLabel::SustainedDrift
            } else {
                AlarmLabel::Clear
            }
        } else if ramp_rate < 0.0 {
            if ramp_rate < -limit || row.freq_delta_f < 0.0 {
                AlarmLabel::SustainedDrift
            } else {
                AlarmLabel::Clear
            }
        } else {
            // NaN ramp: no branch applies
            AlarmLabel::Clear
        };

        StepOutcome {
            label,
            tracker,
            ramp_rate,
            resolved_at: FlowchartStep::SustainedDrift,
        }
    }
}
