//! Execution context handed to each stage.
//!
//! This module provides:
//! - Pipeline inputs (scrape target, filter spec, CRM destinations, lead set)
//! - The read-only store of prior stage results
//! - The per-stage context with its progress reporter

mod inputs;
mod results;
mod stage;

pub use inputs::{ConnectionStatus, CrmDestination, PipelineInputs, ScrapeTarget};
pub use results::ResultStore;
pub use stage::{ProgressReporter, StageContext};
