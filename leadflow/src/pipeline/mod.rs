//! Pipeline building and execution.
//!
//! This module provides:
//! - Stage specifications and validated pipeline definitions
//! - Pipeline builder with wiring validation
//! - The stage record and pipeline state machines
//! - The task-per-pipeline runner

mod builder;
#[cfg(test)]
mod integration_tests;
mod record;
mod runner;
mod spec;
mod state;

pub use builder::PipelineBuilder;
pub use record::StageRecord;
pub use runner::{run_pipeline, PipelineHandle};
pub use spec::{PipelineDefinition, StageSpec};
pub use state::{PipelineSnapshot, PipelineState};
