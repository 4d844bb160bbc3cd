//! Pipeline orchestration
//!
//! This module provides the public API for AGC Flowchart. A classification
//! pass walks the samples oldest to newest:
//!
//! 1. FeatureDeriver - apply the perturbation and compute E, ∆F, ∆P, N
//! 2. StepClassifier - run the three-step flowchart against the previous row
//! 3. DriftTracker - carry the hysteresis counter into the next row
//!
//! Each row depends on the state left by the one before it, so rows are never
//! evaluated out of order. Every pass starts from a fresh state.

use crate::classifier::{StepClassifier, StepInput};
use crate::config::FlowchartConfig;
use crate::encoder::{ClassificationReport, ReportEncoder};
use crate::error::FlowchartError;
use crate::features::FeatureDeriver;
use crate::hysteresis::DriftTracker;
use crate::perturbation::{Perturbation, PerturbationRequest};
use crate::schema::SampleAdapter;
use crate::types::{AnnotatedRow, DerivedRow, Sample};

/// Classify a sequence of samples with the default thresholds.
///
/// # Arguments
/// * `samples` - Samples in ascending timestamp order (not re-sorted)
/// * `perturbation` - Optional injected fault
///
/// # Returns
/// One annotated row per sample, in input order
///
/// # Example
/// ```ignore
/// let rows = classify(&samples, None);
/// assert_eq!(rows.len(), samples.len());
/// ```
pub fn classify(samples: &[Sample], perturbation: Option<&Perturbation>) -> Vec<AnnotatedRow> {
    classify_with_config(samples, perturbation, &FlowchartConfig::default())
}

/// Classify a sequence of samples with explicit thresholds.
pub fn classify_with_config(
    samples: &[Sample],
    perturbation: Option<&Perturbation>,
    config: &FlowchartConfig,
) -> Vec<AnnotatedRow> {
    log::debug!(
        "classifying {} samples (perturbation: {})",
        samples.len(),
        match perturbation {
            Some(p) if p.is_resolved() => "active",
            Some(_) => "unresolved",
            None => "none",
        }
    );

    let rows: Vec<AnnotatedRow> = SequenceRunner::new(samples, perturbation, config).collect();

    log::debug!(
        "pass complete: {} alarms in {} rows",
        rows.iter().filter(|r| r.alarm.is_alarm()).count(),
        rows.len()
    );

    rows
}

/// State threaded from one row to the next within a single pass
#[derive(Debug, Clone, Default)]
pub struct ClassificationState {
    /// Previous derived row (carries its timestamp and effective frequency)
    pub previous: Option<DerivedRow>,
    /// Ramp rate reported for the previous row
    pub previous_ramp_rate: f64,
    /// Drift hysteresis counter
    pub tracker: DriftTracker,
}

impl ClassificationState {
    /// Initial state for a pass with the given drift threshold
    pub fn new(drift_alarm_threshold: u32) -> Self {
        Self {
            previous: None,
            previous_ramp_rate: 0.0,
            tracker: DriftTracker::new(drift_alarm_threshold),
        }
    }
}

/// Lazy, in-order classification pass.
///
/// Yields one annotated row per sample. Callers that need to stop part way
/// (for example a row-by-row playback) can simply stop pulling rows; the
/// state after any prefix is exactly what a full pass would have at that row.
pub struct SequenceRunner<'a> {
    samples: std::slice::Iter<'a, Sample>,
    perturbation: Option<&'a Perturbation>,
    config: &'a FlowchartConfig,
    deriver: FeatureDeriver,
    state: ClassificationState,
}

impl<'a> SequenceRunner<'a> {
    pub fn new(
        samples: &'a [Sample],
        perturbation: Option<&'a Perturbation>,
        config: &'a FlowchartConfig,
    ) -> Self {
        Self {
            samples: samples.iter(),
            perturbation,
            config,
            deriver: FeatureDeriver::new(config.nominal_frequency_hz),
            state: ClassificationState::new(config.drift_alarm_threshold),
        }
    }

    /// State after the rows yielded so far
    pub fn state(&self) -> &ClassificationState {
        &self.state
    }
}

impl Iterator for SequenceRunner<'_> {
    type Item = AnnotatedRow;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.samples.next()?;
        let derived = self.deriver.derive(sample, self.perturbation);

        let outcome = StepClassifier::new(self.config).classify(StepInput {
            current: &derived,
            previous: self.state.previous.as_ref(),
            tracker: self.state.tracker,
            previous_ramp_rate: self.state.previous_ramp_rate,
        });

        self.state.tracker = outcome.tracker;
        self.state.previous_ramp_rate = outcome.ramp_rate;
        self.state.previous = Some(derived.clone());

        Some(AnnotatedRow {
            derived,
            ramp_rate: outcome.ramp_rate,
            alarm: outcome.label,
            resolved_at: outcome.resolved_at,
            drift_counter: outcome.tracker.count(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.samples.size_hint()
    }
}

impl ExactSizeIterator for SequenceRunner<'_> {}

/// Processor holding thresholds and the currently injected fault.
///
/// Applying or clearing a perturbation only changes what the next pass sees;
/// every call to [`FlowchartProcessor::process`] recomputes from scratch.
pub struct FlowchartProcessor {
    config: FlowchartConfig,
    perturbation: Option<Perturbation>,
    encoder: ReportEncoder,
}

impl Default for FlowchartProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowchartProcessor {
    /// Create a new processor with default thresholds
    pub fn new() -> Self {
        Self {
            config: FlowchartConfig::default(),
            perturbation: None,
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a processor with specific thresholds
    pub fn with_config(config: FlowchartConfig) -> Self {
        Self {
            config,
            perturbation: None,
            encoder: ReportEncoder::new(),
        }
    }

    /// Load thresholds from JSON
    pub fn load_config(&mut self, json: &str) -> Result<(), FlowchartError> {
        self.config = FlowchartConfig::from_json(json)?;
        Ok(())
    }

    pub fn config(&self) -> &FlowchartConfig {
        &self.config
    }

    /// Replace the active perturbation
    pub fn apply_perturbation(&mut self, perturbation: Perturbation) {
        self.perturbation = Some(perturbation);
    }

    /// Resolve and apply a user-entered perturbation
    pub fn apply_request(&mut self, request: &PerturbationRequest) {
        self.apply_perturbation(Perturbation::from_request(request));
    }

    /// Remove the active perturbation
    pub fn clear_perturbation(&mut self) {
        self.perturbation = None;
    }

    pub fn perturbation(&self) -> Option<&Perturbation> {
        self.perturbation.as_ref()
    }

    /// Run a full pass over the samples
    pub fn process(&self, samples: &[Sample]) -> Vec<AnnotatedRow> {
        classify_with_config(samples, self.perturbation.as_ref(), &self.config)
    }

    /// Run a full pass and wrap the rows in a report
    pub fn report(&self, samples: &[Sample]) -> ClassificationReport {
        let rows = self.process(samples);
        self.encoder.encode(rows, self.perturbation.clone())
    }

    /// Parse a JSON array of sample records, classify and return the JSON report
    pub fn process_json(&self, samples_json: &str) -> Result<String, FlowchartError> {
        let records = SampleAdapter::parse_array(samples_json)?;
        let samples = SampleAdapter::to_samples(&records)?;
        self.encoder.to_json(&self.report(&samples))
    }
}
