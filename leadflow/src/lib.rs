//! # Leadflow
//!
//! Sequential, observable orchestration of lead-generation pipelines.
//!
//! A pipeline is an ordered list of stages (scrape, filter, qualify, sync,
//! quality, report). Leadflow provides:
//!
//! - **Stage-based execution**: stages run strictly in order on one tokio task per pipeline
//! - **Typed results**: every stage produces a `StageResult` variant matching its kind
//! - **Event-driven observability**: progress and lifecycle events for every stage
//! - **Collaborator ports**: async traits for scraping, filtering, qualification,
//!   CRM sync, data quality and reporting, with in-memory and simulated implementations
//! - **Cancellation**: cooperative, per-pipeline cancellation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leadflow::prelude::*;
//!
//! let collaborators = Collaborators::in_memory(QualificationConfig::default())?;
//! let definition = collaborators.definition("Healthcare AI Prospects")?;
//!
//! let orchestrator = Orchestrator::default();
//! let id = orchestrator.create_pipeline(&definition, inputs)?;
//! let snapshot = orchestrator.wait(id).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod export;
pub mod leads;
pub mod observability;
pub mod orchestrator;
pub mod pipeline;
pub mod qualification;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::collaborators::{
        Collaborators, CrmSync, LeadFilter, QualityChecker, Qualifier, Reporter, Scraper,
    };
    pub use crate::config::{LeadflowConfig, OrchestratorConfig, SimulationConfig};
    pub use crate::context::{
        CrmDestination, PipelineInputs, ResultStore, ScrapeTarget, StageContext,
    };
    pub use crate::core::{
        PipelineEvent, PipelineId, PipelineStatus, RolledUpCounters, StageKind, StageResult,
        StageStatus,
    };
    pub use crate::errors::{
        CollaboratorError, ContractErrorInfo, InvalidTransitionError, LeadflowError,
        PipelineNotFoundError, PipelineValidationError, StageFailure,
    };
    pub use crate::events::{
        BroadcastEventSink, CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::leads::{FilterSpec, Lead, LeadSet, Priority};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::pipeline::{
        PipelineBuilder, PipelineDefinition, PipelineSnapshot, StageRecord, StageSpec,
    };
    pub use crate::qualification::{QualificationConfig, WeightedQualifier};
    pub use crate::stages::{CollaboratorStage, Stage};
}
