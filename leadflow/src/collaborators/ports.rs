//! Collaborator ports.
//!
//! One async trait per stage kind. Each receives the stage context and
//! returns its typed result, or a `CollaboratorError` that fails the stage.

use crate::context::StageContext;
use crate::core::{
    FilterResult, QualificationResult, QualityResult, ReportResult, ScrapeResult, SyncResult,
};
use crate::errors::CollaboratorError;
use async_trait::async_trait;

/// Collects raw leads from the pipeline's scrape target.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Runs the scrape.
    async fn scrape(&self, ctx: &StageContext) -> Result<ScrapeResult, CollaboratorError>;
}

/// Narrows the lead set with the pipeline's filter spec.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadFilter: Send + Sync {
    /// Applies the filter.
    async fn filter(&self, ctx: &StageContext) -> Result<FilterResult, CollaboratorError>;
}

/// Scores and prioritises the filtered leads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Qualifier: Send + Sync {
    /// Runs qualification.
    async fn qualify(&self, ctx: &StageContext) -> Result<QualificationResult, CollaboratorError>;
}

/// Pushes qualified leads to CRM destinations.
///
/// Leads a destination refuses are counted in `failed_sync`, not raised.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmSync: Send + Sync {
    /// Runs the sync.
    async fn sync(&self, ctx: &StageContext) -> Result<SyncResult, CollaboratorError>;
}

/// Checks synced records for duplicates, gaps and malformed fields.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QualityChecker: Send + Sync {
    /// Runs the check.
    async fn check(&self, ctx: &StageContext) -> Result<QualityResult, CollaboratorError>;
}

/// Summarises every prior result into reports and alerts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Reporter: Send + Sync {
    /// Produces the reports.
    async fn report(&self, ctx: &StageContext) -> Result<ReportResult, CollaboratorError>;
}
