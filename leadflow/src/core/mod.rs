//! Core domain model types for leadflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Stage kind, stage status and pipeline status enums
//! - Typed stage results and the rolled-up counters projected from them
//! - Pipeline identifiers and observer events

mod event;
mod identity;
mod result;
mod status;

pub use event::PipelineEvent;
pub use identity::PipelineId;
pub use result::{
    FilterResult, QualificationResult, QualityResult, ReportResult, RolledUpCounters,
    ScrapeResult, StageResult, SyncResult,
};
pub use status::{PipelineStatus, StageKind, StageStatus};
