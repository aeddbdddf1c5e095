//! Collaborator ports and their in-process implementations.
//!
//! This module provides:
//! - One async port per stage kind (`Scraper`, `LeadFilter`, `Qualifier`,
//!   `CrmSync`, `QualityChecker`, `Reporter`)
//! - In-memory collaborators working over the pipeline's lead set
//! - Simulated collaborators replaying the reference run (feature `simulation`)
//! - `Collaborators`, a bundle that assembles the full lead pipeline

mod memory;
mod ports;
mod reference;
#[cfg(feature = "simulation")]
mod simulated;

pub use memory::{
    is_valid_email, lead_fingerprint, FingerprintQualityChecker, InMemoryCrm, InMemoryScraper,
    PredicateFilter, SummaryReporter,
};
#[cfg(test)]
pub use ports::{
    MockCrmSync, MockLeadFilter, MockQualifier, MockQualityChecker, MockReporter, MockScraper,
};
pub use ports::{CrmSync, LeadFilter, QualityChecker, Qualifier, Reporter, Scraper};
pub use reference::reference_result;
#[cfg(feature = "simulation")]
pub use simulated::SimulatedCollaborators;

use crate::errors::PipelineValidationError;
use crate::pipeline::{PipelineBuilder, PipelineDefinition};
use crate::qualification::{QualificationConfig, WeightedQualifier};
use crate::stages::CollaboratorStage;
use std::sync::Arc;

/// One collaborator per stage kind.
#[derive(Clone)]
pub struct Collaborators {
    /// Scrape port.
    pub scraper: Arc<dyn Scraper>,
    /// Filter port.
    pub filter: Arc<dyn LeadFilter>,
    /// Qualification port.
    pub qualifier: Arc<dyn Qualifier>,
    /// CRM sync port.
    pub crm: Arc<dyn CrmSync>,
    /// Data-quality port.
    pub quality: Arc<dyn QualityChecker>,
    /// Report port.
    pub reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

impl Collaborators {
    /// Creates the in-memory collaborator set.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the qualification configuration is
    /// rejected.
    pub fn in_memory(qualification: QualificationConfig) -> Result<Self, PipelineValidationError> {
        Ok(Self {
            scraper: Arc::new(InMemoryScraper::new()),
            filter: Arc::new(PredicateFilter::new()),
            qualifier: Arc::new(WeightedQualifier::new(qualification)?),
            crm: Arc::new(InMemoryCrm::new()),
            quality: Arc::new(FingerprintQualityChecker::new()),
            reporter: Arc::new(SummaryReporter::new()),
        })
    }

    /// Creates a collaborator set that replays the reference run.
    #[cfg(feature = "simulation")]
    #[must_use]
    pub fn simulated(config: crate::config::SimulationConfig) -> Self {
        let sim = Arc::new(SimulatedCollaborators::new(config));
        Self {
            scraper: sim.clone(),
            filter: sim.clone(),
            qualifier: sim.clone(),
            crm: sim.clone(),
            quality: sim.clone(),
            reporter: sim,
        }
    }

    /// Replaces the scrape port.
    #[must_use]
    pub fn with_scraper(mut self, scraper: Arc<dyn Scraper>) -> Self {
        self.scraper = scraper;
        self
    }

    /// Replaces the filter port.
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn LeadFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Replaces the qualification port.
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: Arc<dyn Qualifier>) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// Replaces the CRM sync port.
    #[must_use]
    pub fn with_crm(mut self, crm: Arc<dyn CrmSync>) -> Self {
        self.crm = crm;
        self
    }

    /// Replaces the data-quality port.
    #[must_use]
    pub fn with_quality(mut self, quality: Arc<dyn QualityChecker>) -> Self {
        self.quality = quality;
        self
    }

    /// Replaces the report port.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Builds the six-stage lead pipeline over these collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is blank.
    pub fn definition(&self, name: impl Into<String>) -> Result<PipelineDefinition, PipelineValidationError> {
        PipelineBuilder::new(name)
            .stage(Arc::new(CollaboratorStage::scrape(self.scraper.clone())))?
            .stage(Arc::new(CollaboratorStage::filter(self.filter.clone())))?
            .stage(Arc::new(CollaboratorStage::qualify(self.qualifier.clone())))?
            .stage(Arc::new(CollaboratorStage::sync(self.crm.clone())))?
            .stage(Arc::new(CollaboratorStage::quality(self.quality.clone())))?
            .stage(Arc::new(CollaboratorStage::report(self.reporter.clone())))?
            .build()
    }
}
