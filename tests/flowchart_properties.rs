//! Property tests for the classification pass

use agc_flowchart::hysteresis::DriftTracker;
use agc_flowchart::{
    classify, AlarmLabel, FlowchartConfig, FlowchartStep, Perturbation, Sample, SequenceRunner,
    TimeWindow,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap()
}

/// Non-decreasing timestamps, mostly one minute apart, with occasional
/// repeated timestamps
fn samples_strategy(max_len: usize) -> impl Strategy<Value = Vec<Sample>> {
    prop::collection::vec(
        (
            prop_oneof![4 => Just(1i64), 1 => Just(0i64), 1 => 2i64..5],
            49.5f64..50.5,
            prop_oneof![Just(100.0f64), 90.0f64..110.0],
            prop_oneof![Just(100.0f64), 90.0f64..110.0],
        ),
        0..max_len,
    )
    .prop_map(|rows| {
        let mut t = base_time();
        rows.into_iter()
            .map(|(step, frequency, agc, limit)| {
                t += Duration::minutes(step);
                Sample::new(t, frequency, agc, limit)
            })
            .collect()
    })
}

fn perturbation_strategy() -> impl Strategy<Value = Perturbation> {
    (0i64..40, 0i64..20, -30.0f64..30.0, -0.5f64..0.5).prop_map(|(start, len, agc, freq)| {
        let start = base_time() + Duration::minutes(start);
        Perturbation::new(
            TimeWindow::new(start, start + Duration::minutes(len)),
            agc,
            freq,
        )
    })
}

proptest! {
    #[test]
    fn prop_row_count_matches_input(samples in samples_strategy(60)) {
        prop_assert_eq!(classify(&samples, None).len(), samples.len());
    }

    #[test]
    fn prop_classification_is_deterministic(
        samples in samples_strategy(60),
        perturbation in perturbation_strategy(),
    ) {
        let first = classify(&samples, Some(&perturbation));
        let second = classify(&samples, Some(&perturbation));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_perturbation_derivation_is_idempotent(
        samples in samples_strategy(40),
        perturbation in perturbation_strategy(),
    ) {
        let first: Vec<_> = classify(&samples, Some(&perturbation))
            .into_iter()
            .map(|r| r.derived)
            .collect();
        let second: Vec<_> = classify(&samples, Some(&perturbation))
            .into_iter()
            .map(|r| r.derived)
            .collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_setpoint_deviation_always_wins(
        samples in samples_strategy(40),
        perturbation in perturbation_strategy(),
    ) {
        for row in classify(&samples, Some(&perturbation)) {
            if row.derived.setpoint_delta_e != 0.0 {
                prop_assert_eq!(row.alarm, AlarmLabel::SetpointTracking);
            } else {
                prop_assert_ne!(row.alarm, AlarmLabel::SetpointTracking);
            }
        }
    }

    #[test]
    fn prop_first_row_defaults(samples in samples_strategy(2)) {
        if let Some(row) = classify(&samples[..samples.len().min(1)], None).first() {
            prop_assert_eq!(row.ramp_rate, 0.0);
            prop_assert_eq!(row.drift_counter, 0);
            prop_assert_ne!(row.alarm, AlarmLabel::SustainedDrift);
        }
    }

    #[test]
    fn prop_counter_follows_quiet_and_early_rows(samples in samples_strategy(60)) {
        let rows = classify(&samples, None);
        let config = FlowchartConfig::default();

        for pair in rows.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            match cur.resolved_at {
                FlowchartStep::SetpointTracking | FlowchartStep::SignConsistency => {
                    prop_assert_eq!(cur.drift_counter, prev.drift_counter);
                    prop_assert_eq!(cur.ramp_rate, prev.ramp_rate);
                }
                FlowchartStep::SustainedDrift => {
                    let counter_moved = cur.drift_counter == 0
                        || cur.drift_counter == prev.drift_counter + 1;
                    prop_assert!(counter_moved);
                    if cur.drift_counter >= config.drift_alarm_threshold {
                        prop_assert_eq!(cur.alarm, AlarmLabel::SustainedDrift);
                    }
                    if cur.alarm == AlarmLabel::SustainedDrift && cur.ramp_rate == 0.0 {
                        prop_assert!(cur.drift_counter >= config.drift_alarm_threshold);
                    }
                }
            }
        }
    }

    #[test]
    fn prop_runner_prefix_is_stable(samples in samples_strategy(50), cut in 0usize..50) {
        let config = FlowchartConfig::default();
        let full = classify(&samples, None);
        let cut = cut.min(samples.len());

        let prefix: Vec<_> = SequenceRunner::new(&samples[..cut], None, &config).collect();
        prop_assert_eq!(prefix.as_slice(), &full[..cut]);
    }
}

#[test]
fn drift_tracker_matches_counter_law() {
    let mut tracker = DriftTracker::default();
    for i in 1..=25u32 {
        tracker = tracker.record_disturbed();
        assert_eq!(tracker.is_sustained(), i >= 20);
    }
    assert_eq!(tracker.record_quiet().count(), 0);
}
