//! Stages backed by collaborator ports.

use super::Stage;
use crate::collaborators::{CrmSync, LeadFilter, QualityChecker, Qualifier, Reporter, Scraper};
use crate::context::StageContext;
use crate::core::{StageKind, StageResult};
use crate::errors::StageFailure;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A collaborator port, tagged by the stage kind it serves.
#[derive(Clone)]
pub enum Collaborator {
    /// Scrape port.
    Scrape(Arc<dyn Scraper>),
    /// Filter port.
    Filter(Arc<dyn LeadFilter>),
    /// Qualification port.
    Qualify(Arc<dyn Qualifier>),
    /// CRM sync port.
    Sync(Arc<dyn CrmSync>),
    /// Data-quality port.
    Quality(Arc<dyn QualityChecker>),
    /// Report port.
    Report(Arc<dyn Reporter>),
}

impl Collaborator {
    /// Returns the stage kind the port serves.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        match self {
            Self::Scrape(_) => StageKind::Scrape,
            Self::Filter(_) => StageKind::Filter,
            Self::Qualify(_) => StageKind::Qualify,
            Self::Sync(_) => StageKind::Sync,
            Self::Quality(_) => StageKind::Quality,
            Self::Report(_) => StageKind::Report,
        }
    }
}

impl fmt::Debug for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Collaborator").field(&self.kind()).finish()
    }
}

/// A stage that delegates its unit of work to a collaborator port.
#[derive(Debug, Clone)]
pub struct CollaboratorStage {
    name: String,
    collaborator: Collaborator,
}

impl CollaboratorStage {
    /// Creates a stage named after the collaborator's kind.
    #[must_use]
    pub fn new(collaborator: Collaborator) -> Self {
        Self {
            name: collaborator.kind().to_string(),
            collaborator,
        }
    }

    /// Overrides the stage name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Creates a scrape stage.
    #[must_use]
    pub fn scrape(scraper: Arc<dyn Scraper>) -> Self {
        Self::new(Collaborator::Scrape(scraper))
    }

    /// Creates a filter stage.
    #[must_use]
    pub fn filter(filter: Arc<dyn LeadFilter>) -> Self {
        Self::new(Collaborator::Filter(filter))
    }

    /// Creates a qualify stage.
    #[must_use]
    pub fn qualify(qualifier: Arc<dyn Qualifier>) -> Self {
        Self::new(Collaborator::Qualify(qualifier))
    }

    /// Creates a sync stage.
    #[must_use]
    pub fn sync(crm: Arc<dyn CrmSync>) -> Self {
        Self::new(Collaborator::Sync(crm))
    }

    /// Creates a quality stage.
    #[must_use]
    pub fn quality(checker: Arc<dyn QualityChecker>) -> Self {
        Self::new(Collaborator::Quality(checker))
    }

    /// Creates a report stage.
    #[must_use]
    pub fn report(reporter: Arc<dyn Reporter>) -> Self {
        Self::new(Collaborator::Report(reporter))
    }
}

#[async_trait]
impl Stage for CollaboratorStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.collaborator.kind()
    }

    async fn run(&self, ctx: &StageContext) -> Result<StageResult, StageFailure> {
        let outcome = match &self.collaborator {
            Collaborator::Scrape(port) => port.scrape(ctx).await.map(StageResult::from),
            Collaborator::Filter(port) => port.filter(ctx).await.map(StageResult::from),
            Collaborator::Qualify(port) => port.qualify(ctx).await.map(StageResult::from),
            Collaborator::Sync(port) => port.sync(ctx).await.map(StageResult::from),
            Collaborator::Quality(port) => port.check(ctx).await.map(StageResult::from),
            Collaborator::Report(port) => port.report(ctx).await.map(StageResult::from),
        };
        outcome.map_err(|cause| StageFailure::new(ctx.stage_name(), cause))
    }
}
