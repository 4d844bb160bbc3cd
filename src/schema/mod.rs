//! Sample record schema
//!
//! This module defines the lenient input record for telemetry tables and the
//! adapter that turns parsed records into ordered samples for classification.

mod record;
mod adapter;

pub use record::*;
pub use adapter::*;
