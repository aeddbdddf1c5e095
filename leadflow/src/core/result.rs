//! Typed stage results.
//!
//! Each stage kind produces exactly one result shape. The shapes are plain
//! counters: partial failures (failed syncs, duplicates, missing data) are
//! reported here as data, not raised as errors.

use super::StageKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of the scrape stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// Number of raw leads collected.
    pub total_leads: u64,
    /// Where the leads came from.
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Output of the filter stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Leads that passed every predicate.
    pub filtered_leads: u64,
    /// Leads dropped by at least one predicate.
    pub removed_leads: u64,
    /// Human-readable labels of the predicates that were active.
    #[serde(default)]
    pub applied_filters: Vec<String>,
}

/// Output of the qualification stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualificationResult {
    /// Leads scoring at or above the qualification threshold.
    pub qualified_leads: u64,
    /// Qualified leads in the high priority band.
    pub high_priority: u64,
    /// Qualified leads in the medium priority band.
    pub medium_priority: u64,
    /// Qualified leads in the low priority band.
    pub low_priority: u64,
}

/// Output of the CRM sync stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Leads accepted by some destination.
    pub synced_leads: u64,
    /// Accepted leads per destination id.
    #[serde(default)]
    pub per_destination_counts: BTreeMap<String, u64>,
    /// Leads no destination accepted.
    pub failed_sync: u64,
}

/// Output of the data-quality stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityResult {
    /// Overall score in `0..=100`.
    pub quality_score: u8,
    /// Records that duplicate an earlier record.
    pub duplicates_found: u64,
    /// Records missing at least one key field.
    pub missing_data: u64,
    /// Records that are unique and complete.
    pub enriched_records: u64,
    /// Records whose contact email is malformed.
    #[serde(default)]
    pub invalid_emails: u64,
}

/// Output of the report stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResult {
    /// Number of reports produced.
    pub reports_generated: u64,
    /// Whether the dashboard view was refreshed.
    pub dashboard_updated: bool,
    /// Number of alerts raised.
    pub alerts_sent: u64,
}

/// The result of a completed stage, discriminated by stage kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageResult {
    /// Scrape output.
    Scrape(ScrapeResult),
    /// Filter output.
    Filter(FilterResult),
    /// Qualification output.
    Qualify(QualificationResult),
    /// CRM sync output.
    Sync(SyncResult),
    /// Data-quality output.
    Quality(QualityResult),
    /// Report output.
    Report(ReportResult),
}

impl StageResult {
    /// Returns the stage kind this result belongs to.
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

    /// Returns the scrape result, if this is one.
    #[must_use]
    pub fn as_scrape(&self) -> Option<&ScrapeResult> {
        match self {
            Self::Scrape(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the filter result, if this is one.
    #[must_use]
    pub fn as_filter(&self) -> Option<&FilterResult> {
        match self {
            Self::Filter(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the qualification result, if this is one.
    #[must_use]
    pub fn as_qualify(&self) -> Option<&QualificationResult> {
        match self {
            Self::Qualify(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the sync result, if this is one.
    #[must_use]
    pub fn as_sync(&self) -> Option<&SyncResult> {
        match self {
            Self::Sync(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the quality result, if this is one.
    #[must_use]
    pub fn as_quality(&self) -> Option<&QualityResult> {
        match self {
            Self::Quality(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the report result, if this is one.
    #[must_use]
    pub fn as_report(&self) -> Option<&ReportResult> {
        match self {
            Self::Report(r) => Some(r),
            _ => None,
        }
    }
}

impl From<ScrapeResult> for StageResult {
    fn from(r: ScrapeResult) -> Self {
        Self::Scrape(r)
    }
}

impl From<FilterResult> for StageResult {
    fn from(r: FilterResult) -> Self {
        Self::Filter(r)
    }
}

impl From<QualificationResult> for StageResult {
    fn from(r: QualificationResult) -> Self {
        Self::Qualify(r)
    }
}

impl From<SyncResult> for StageResult {
    fn from(r: SyncResult) -> Self {
        Self::Sync(r)
    }
}

impl From<QualityResult> for StageResult {
    fn from(r: QualityResult) -> Self {
        Self::Quality(r)
    }
}

impl From<ReportResult> for StageResult {
    fn from(r: ReportResult) -> Self {
        Self::Report(r)
    }
}

/// Pipeline-level counters projected from specific completed stage results.
///
/// Never mutated independently: each counter is read from the first
/// completed result of its stage kind and is zero until that stage completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolledUpCounters {
    /// `total_leads` of the scrape result.
    pub total_leads: u64,
    /// `qualified_leads` of the qualification result.
    pub qualified_leads: u64,
    /// `synced_leads` of the sync result.
    pub synced_leads: u64,
}

impl RolledUpCounters {
    /// Projects counters from completed stage results.
    #[must_use]
    pub fn project<'a>(results: impl IntoIterator<Item = &'a StageResult>) -> Self {
        let mut counters = Self::default();
        let (mut scrape_seen, mut qualify_seen, mut sync_seen) = (false, false, false);

        for result in results {
            match result {
                StageResult::Scrape(r) if !scrape_seen => {
                    counters.total_leads = r.total_leads;
                    scrape_seen = true;
                }
                StageResult::Qualify(r) if !qualify_seen => {
                    counters.qualified_leads = r.qualified_leads;
                    qualify_seen = true;
                }
                StageResult::Sync(r) if !sync_seen => {
                    counters.synced_leads = r.synced_leads;
                    sync_seen = true;
                }
                _ => {}
            }
        }

        counters
    }
}
