//! Read-only view of prior stage results.

use crate::core::{
    FilterResult, QualificationResult, QualityResult, ReportResult, RolledUpCounters,
    ScrapeResult, StageKind, StageResult, SyncResult,
};
use crate::errors::CollaboratorError;

/// The results of every stage that completed before the current one, in
/// pipeline order.
///
/// Typed getters return the first result of the requested kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultStore {
    entries: Vec<(String, StageResult)>,
}

impl ResultStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage result.
    #[must_use]
    pub fn with_result(mut self, stage: impl Into<String>, result: StageResult) -> Self {
        self.entries.push((stage.into(), result));
        self
    }

    /// Returns the result of a stage by name.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&StageResult> {
        self.entries
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, result)| result)
    }

    /// Returns the first result of a kind.
    #[must_use]
    pub fn first_of_kind(&self, kind: StageKind) -> Option<&StageResult> {
        self.entries
            .iter()
            .map(|(_, result)| result)
            .find(|result| result.kind() == kind)
    }

    /// Returns true if a result of the kind is present.
    #[must_use]
    pub fn contains_kind(&self, kind: StageKind) -> bool {
        self.first_of_kind(kind).is_some()
    }

    /// Returns the scrape result, if any.
    #[must_use]
    pub fn scrape(&self) -> Option<&ScrapeResult> {
        self.first_of_kind(StageKind::Scrape).and_then(StageResult::as_scrape)
    }

    /// Returns the filter result, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&FilterResult> {
        self.first_of_kind(StageKind::Filter).and_then(StageResult::as_filter)
    }

    /// Returns the qualification result, if any.
    #[must_use]
    pub fn qualify(&self) -> Option<&QualificationResult> {
        self.first_of_kind(StageKind::Qualify).and_then(StageResult::as_qualify)
    }

    /// Returns the sync result, if any.
    #[must_use]
    pub fn sync(&self) -> Option<&SyncResult> {
        self.first_of_kind(StageKind::Sync).and_then(StageResult::as_sync)
    }

    /// Returns the quality result, if any.
    #[must_use]
    pub fn quality(&self) -> Option<&QualityResult> {
        self.first_of_kind(StageKind::Quality).and_then(StageResult::as_quality)
    }

    /// Returns the report result, if any.
    #[must_use]
    pub fn report(&self) -> Option<&ReportResult> {
        self.first_of_kind(StageKind::Report).and_then(StageResult::as_report)
    }

    /// Returns the scrape result or a missing-input error.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::MissingInput` if no scrape stage completed.
    pub fn require_scrape(&self) -> Result<&ScrapeResult, CollaboratorError> {
        self.scrape()
            .ok_or_else(|| CollaboratorError::missing_input("scrape result"))
    }

    /// Returns the filter result or a missing-input error.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::MissingInput` if no filter stage completed.
    pub fn require_filter(&self) -> Result<&FilterResult, CollaboratorError> {
        self.filter()
            .ok_or_else(|| CollaboratorError::missing_input("filter result"))
    }

    /// Returns the qualification result or a missing-input error.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::MissingInput` if no qualify stage completed.
    pub fn require_qualify(&self) -> Result<&QualificationResult, CollaboratorError> {
        self.qualify()
            .ok_or_else(|| CollaboratorError::missing_input("qualification result"))
    }

    /// Returns the sync result or a missing-input error.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::MissingInput` if no sync stage completed.
    pub fn require_sync(&self) -> Result<&SyncResult, CollaboratorError> {
        self.sync()
            .ok_or_else(|| CollaboratorError::missing_input("sync result"))
    }

    /// Returns the quality result or a missing-input error.
    ///
    /// # Errors
    ///
    /// Returns `CollaboratorError::MissingInput` if no quality stage completed.
    pub fn require_quality(&self) -> Result<&QualityResult, CollaboratorError> {
        self.quality()
            .ok_or_else(|| CollaboratorError::missing_input("quality result"))
    }

    /// Iterates over `(stage name, result)` pairs in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StageResult)> {
        self.entries.iter().map(|(name, result)| (name.as_str(), result))
    }

    /// Returns the rolled-up counters projected from the stored results.
    #[must_use]
    pub fn counters(&self) -> RolledUpCounters {
        RolledUpCounters::project(self.entries.iter().map(|(_, result)| result))
    }

    /// Returns the number of stored results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no results are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, StageResult)> for ResultStore {
    fn from_iter<I: IntoIterator<Item = (String, StageResult)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
