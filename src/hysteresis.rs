//! Drift hysteresis
//!
//! A single frequency excursion is noise; a run of them is drift. The tracker
//! counts consecutive disturbed rows seen by the zero-ramp branch of the
//! flowchart and reports sustained drift once the count reaches the alarm
//! threshold. The count keeps growing past the threshold and only a quiet row
//! brings it back to zero.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_DRIFT_ALARM_THRESHOLD;

/// Pass-scoped drift counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftTracker {
    /// Consecutive disturbed rows
    count: u32,
    /// Count at which drift is considered sustained
    threshold: u32,
}

impl Default for DriftTracker {
    fn default() -> Self {
        Self::new(DEFAULT_DRIFT_ALARM_THRESHOLD)
    }
}

impl DriftTracker {
    /// Create a tracker at zero with the given alarm threshold
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Tracker after a quiet row
    #[must_use]
    pub fn record_quiet(self) -> Self {
        Self { count: 0, ..self }
    }

    /// Tracker after a disturbed row
    #[must_use]
    pub fn record_disturbed(self) -> Self {
        Self {
            count: self.count.saturating_add(1),
            ..self
        }
    }

    /// True once the run of disturbed rows has reached the threshold
    pub fn is_sustained(&self) -> bool {
        self.count >= self.threshold
    }
}
