//! Synthetic fault injection
//!
//! A perturbation adds fixed offsets to the AGC setpoint and/or the measured
//! frequency over a closed time window. It never touches stored samples; the
//! feature deriver consults it on every pass to produce the "after" values.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::timestamp::{self, parse_timestamp};

/// User-entered perturbation before the window is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerturbationRequest {
    /// Window start as typed by the user
    pub start: String,
    /// Window end as typed by the user
    pub end: String,
    /// AGC offset to add (MW)
    #[serde(default)]
    pub agc_offset: f64,
    /// Frequency offset to add (Hz)
    #[serde(default)]
    pub frequency_offset: f64,
}

/// Closed time interval `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "timestamp::lenient")]
    pub start: NaiveDateTime,
    #[serde(with = "timestamp::lenient")]
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends; an inverted window contains nothing
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        *timestamp >= self.start && *timestamp <= self.end
    }
}

/// Active perturbation
///
/// `window` is `None` when either bound failed to parse, in which case the
/// perturbation matches no rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perturbation {
    pub window: Option<TimeWindow>,
    /// AGC offset (MW)
    pub agc_offset: f64,
    /// Frequency offset (Hz)
    pub frequency_offset: f64,
}

/// Offsets that apply to one particular row
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AppliedOffsets {
    pub agc: Option<f64>,
    pub frequency: Option<f64>,
}

impl AppliedOffsets {
    pub fn any(&self) -> bool {
        self.agc.is_some() || self.frequency.is_some()
    }
}

impl Perturbation {
    pub fn new(window: TimeWindow, agc_offset: f64, frequency_offset: f64) -> Self {
        Self {
            window: Some(window),
            agc_offset,
            frequency_offset,
        }
    }

    /// Resolve a user request, tolerating unparseable bounds
    pub fn from_request(request: &PerturbationRequest) -> Self {
        let window = match (parse_timestamp(&request.start), parse_timestamp(&request.end)) {
            (Some(start), Some(end)) => Some(TimeWindow::new(start, end)),
            _ => {
                log::warn!(
                    "perturbation window [{:?}, {:?}] is malformed; it will match no rows",
                    request.start,
                    request.end
                );
                None
            }
        };

        Self {
            window,
            agc_offset: request.agc_offset,
            frequency_offset: request.frequency_offset,
        }
    }

    /// True when the window resolved
    pub fn is_resolved(&self) -> bool {
        self.window.is_some()
    }

    /// Offsets to apply at `timestamp`; zero offsets are never applied
    pub fn offsets_at(&self, timestamp: &NaiveDateTime) -> AppliedOffsets {
        match &self.window {
            Some(window) if window.contains(timestamp) => AppliedOffsets {
                agc: (self.agc_offset != 0.0).then_some(self.agc_offset),
                frequency: (self.frequency_offset != 0.0).then_some(self.frequency_offset),
            },
            _ => AppliedOffsets::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: &str, end: &str) -> PerturbationRequest {
        PerturbationRequest {
            start: start.to_string(),
            end: end.to_string(),
            agc_offset: -20.0,
            frequency_offset: 0.0,
        }
    }

    #[test]
    fn test_window_is_inclusive() {
        let p = Perturbation::from_request(&request("2024-01-01 00:01:00", "2024-01-01 00:03:00"));
        let at = |s: &str| p.offsets_at(&parse_timestamp(s).unwrap());

        assert!(!at("2024-01-01 00:00:00").any());
        assert_eq!(at("2024-01-01 00:01:00").agc, Some(-20.0));
        assert_eq!(at("2024-01-01 00:03:00").agc, Some(-20.0));
        assert!(!at("2024-01-01 00:04:00").any());
    }

    #[test]
    fn test_zero_offset_not_applied() {
        let p = Perturbation::from_request(&request("2024-01-01 00:00:00", "2024-01-01 01:00:00"));
        let offsets = p.offsets_at(&parse_timestamp("2024-01-01 00:30:00").unwrap());
        assert_eq!(offsets.agc, Some(-20.0));
        assert_eq!(offsets.frequency, None);
    }

    #[test]
    fn test_malformed_window_matches_nothing() {
        let p = Perturbation::from_request(&request("yesterday", "2024-01-01 01:00:00"));
        assert!(!p.is_resolved());
        let offsets = p.offsets_at(&parse_timestamp("2024-01-01 00:30:00").unwrap());
        assert!(!offsets.any());
    }

    #[test]
    fn test_inverted_window_matches_nothing() {
        let p = Perturbation::from_request(&request("2024-01-01 02:00:00", "2024-01-01 01:00:00"));
        assert!(p.is_resolved());
        assert!(!p
            .offsets_at(&parse_timestamp("2024-01-01 01:30:00").unwrap())
            .any());
    }
}
