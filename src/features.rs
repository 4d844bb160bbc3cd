//! Feature derivation
//!
//! This module derives the per-row flowchart quantities from a raw sample:
//! - AGC setpoint after any injected offset
//! - E, the setpoint deviation introduced by the injection
//! - ∆F and ∆P, the frequency and power deviations
//! - N = ∆F × ∆P

use crate::perturbation::Perturbation;
use crate::types::{DerivedRow, Sample};

/// Feature deriver for computing derived rows
pub struct FeatureDeriver {
    nominal_frequency_hz: f64,
}

impl FeatureDeriver {
    pub fn new(nominal_frequency_hz: f64) -> Self {
        Self {
            nominal_frequency_hz,
        }
    }

    /// Derive features from a sample, applying the perturbation if it covers
    /// the sample's timestamp
    pub fn derive(&self, sample: &Sample, perturbation: Option<&Perturbation>) -> DerivedRow {
        let offsets = perturbation
            .map(|p| p.offsets_at(&sample.timestamp))
            .unwrap_or_default();

        let agc_setpoint_after = sample.agc_setpoint_before + offsets.agc.unwrap_or(0.0);
        let frequency = sample.frequency + offsets.frequency.unwrap_or(0.0);

        let setpoint_delta_e = sample.agc_setpoint_before - agc_setpoint_after;
        let freq_delta_f = frequency - self.nominal_frequency_hz;
        let power_delta_p = agc_setpoint_after - sample.unit_limit_setpoint;

        DerivedRow {
            timestamp: sample.timestamp,
            frequency,
            agc_setpoint_before: sample.agc_setpoint_before,
            agc_setpoint_after,
            unit_limit_setpoint: sample.unit_limit_setpoint,
            setpoint_delta_e,
            freq_delta_f,
            power_delta_p,
            product_n: freq_delta_f * power_delta_p,
            perturbed: offsets.any(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perturbation::TimeWindow;
    use crate::timestamp::parse_timestamp;

    fn sample(ts: &str, frequency: f64, agc: f64, limit: f64) -> Sample {
        Sample::new(parse_timestamp(ts).unwrap(), frequency, agc, limit)
    }

    fn window(start: &str, end: &str) -> TimeWindow {
        TimeWindow::new(parse_timestamp(start).unwrap(), parse_timestamp(end).unwrap())
    }

    #[test]
    fn test_unperturbed_row() {
        let deriver = FeatureDeriver::new(50.0);
        let row = deriver.derive(&sample("2024-01-01 00:00:00", 50.5, 110.0, 100.0), None);

        assert_eq!(row.agc_setpoint_after, 110.0);
        assert_eq!(row.setpoint_delta_e, 0.0);
        assert!((row.freq_delta_f - 0.5).abs() < 1e-9);
        assert_eq!(row.power_delta_p, 10.0);
        assert!((row.product_n - 5.0).abs() < 1e-9);
        assert!(!row.perturbed);
    }

    #[test]
    fn test_agc_offset_inside_window() {
        let deriver = FeatureDeriver::new(50.0);
        let p = Perturbation::new(
            window("2024-01-01 00:01:00", "2024-01-01 00:01:00"),
            -20.0,
            0.0,
        );
        let row = deriver.derive(&sample("2024-01-01 00:01:00", 50.0, 100.0, 100.0), Some(&p));

        assert_eq!(row.agc_setpoint_after, 80.0);
        assert_eq!(row.setpoint_delta_e, 20.0);
        assert_eq!(row.power_delta_p, -20.0);
        assert_eq!(row.frequency, 50.0);
        assert!(row.perturbed);
    }

    #[test]
    fn test_frequency_offset_independent_of_agc() {
        let deriver = FeatureDeriver::new(50.0);
        let p = Perturbation::new(
            window("2024-01-01 00:00:00", "2024-01-01 01:00:00"),
            0.0,
            0.3,
        );
        let row = deriver.derive(&sample("2024-01-01 00:30:00", 50.0, 100.0, 90.0), Some(&p));

        assert_eq!(row.agc_setpoint_after, 100.0);
        assert_eq!(row.setpoint_delta_e, 0.0);
        assert!((row.frequency - 50.3).abs() < 1e-9);
        assert!((row.freq_delta_f - 0.3).abs() < 1e-9);
        assert!(row.perturbed);
    }

    #[test]
    fn test_outside_window_untouched() {
        let deriver = FeatureDeriver::new(50.0);
        let p = Perturbation::new(
            window("2024-01-01 01:00:00", "2024-01-01 02:00:00"),
            5.0,
            0.1,
        );
        let s = sample("2024-01-01 00:30:00", 49.9, 100.0, 100.0);
        let with = deriver.derive(&s, Some(&p));
        let without = deriver.derive(&s, None);
        assert_eq!(with, without);
    }
}
