//! AGC Flowchart - Anomaly classification for power-grid AGC telemetry
//!
//! Flowchart classifies each sample of an Automatic Generation Control time
//! series through a deterministic pass: fault injection → feature derivation
//! → three-step decision flowchart → drift hysteresis → annotated row.
//!
//! ## Alarms
//!
//! - `1`: the effective AGC setpoint deviates from the commanded one
//! - `2`: frequency and power deviations have inconsistent signs
//! - `3`: frequency drift has persisted without corrective action

pub mod classifier;
pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod hysteresis;
pub mod perturbation;
pub mod pipeline;
pub mod schema;
pub mod summary;
pub mod timestamp;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::FlowchartConfig;
pub use error::FlowchartError;
pub use perturbation::{Perturbation, PerturbationRequest, TimeWindow};
pub use pipeline::{classify, classify_with_config, FlowchartProcessor, SequenceRunner};
pub use types::{AlarmLabel, AnnotatedRow, DerivedRow, FlowchartStep, Sample};

// Schema exports
pub use schema::{SampleAdapter, SampleRecord, ValidationError};

/// Crate version embedded in every report
pub const FLOWCHART_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "agc-flowchart";
