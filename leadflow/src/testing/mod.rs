//! Testing utilities for leadflow pipelines.
//!
//! This module provides:
//! - Scripted stages with controllable outcomes, progress and timing
//! - Lead and pipeline fixtures
//! - Assertions over snapshots and event streams

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_event_order, assert_no_progress_after_finish, assert_pipeline_status,
    assert_stage_statuses,
};
pub use fixtures::{mock_inputs, mock_leads, reference_definition};
pub use mocks::ScriptedStage;
