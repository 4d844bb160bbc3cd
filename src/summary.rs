//! Alarm tallies for a classified pass

use serde::{Deserialize, Serialize};

use crate::types::{AlarmLabel, AnnotatedRow};

/// Per-label counts and drift statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSummary {
    pub total_rows: usize,
    pub clear: usize,
    pub setpoint_tracking: usize,
    pub sign_consistency: usize,
    pub sustained_drift: usize,
    /// Rows touched by the injected fault
    pub perturbed_rows: usize,
    /// Longest run of consecutive sustained-drift rows
    pub longest_drift_run: usize,
}

impl AlarmSummary {
    pub fn from_rows(rows: &[AnnotatedRow]) -> Self {
        let mut summary = AlarmSummary {
            total_rows: rows.len(),
            ..Default::default()
        };
        let mut run = 0usize;

        for row in rows {
            match row.alarm {
                AlarmLabel::Clear => summary.clear += 1,
                AlarmLabel::SetpointTracking => summary.setpoint_tracking += 1,
                AlarmLabel::SignConsistency => summary.sign_consistency += 1,
                AlarmLabel::SustainedDrift => summary.sustained_drift += 1,
            }

            if row.derived.perturbed {
                summary.perturbed_rows += 1;
            }

            if row.alarm == AlarmLabel::SustainedDrift {
                run += 1;
                summary.longest_drift_run = summary.longest_drift_run.max(run);
            } else {
                run = 0;
            }
        }

        summary
    }

    pub fn alarm_count(&self) -> usize {
        self.setpoint_tracking + self.sign_consistency + self.sustained_drift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify;
    use crate::timestamp::parse_timestamp;
    use crate::types::Sample;
    use chrono::Duration;

    #[test]
    fn test_counts_and_runs() {
        let t0 = parse_timestamp("2024-01-01 00:00:00").unwrap();
        let mut samples: Vec<Sample> = (0..23)
            .map(|i| {
                let frequency = if i % 2 == 0 { 49.95 } else { 50.15 };
                Sample::new(t0 + Duration::minutes(i), frequency, 100.0, 100.0)
            })
            .collect();
        // Sign-consistency row breaks the drift run without touching the counter
        samples.push(Sample::new(t0 + Duration::minutes(23), 50.5, 110.0, 100.0));

        let summary = AlarmSummary::from_rows(&classify(&samples, None));
        assert_eq!(summary.total_rows, 24);
        assert_eq!(summary.sustained_drift, 3);
        assert_eq!(summary.sign_consistency, 1);
        assert_eq!(summary.clear, 20);
        assert_eq!(summary.longest_drift_run, 3);
        assert_eq!(summary.alarm_count(), 4);
        assert_eq!(summary.perturbed_rows, 0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(AlarmSummary::from_rows(&[]), AlarmSummary::default());
    }
}
