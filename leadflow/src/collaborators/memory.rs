//! In-memory collaborators.
//!
//! These do real work over the pipeline's lead set: each stage reads the
//! working set, narrows or annotates it, and writes it back.

use super::{CrmSync, LeadFilter, QualityChecker, Reporter, Scraper};
use crate::context::StageContext;
use crate::core::{FilterResult, QualityResult, ReportResult, ScrapeResult, SyncResult};
use crate::errors::CollaboratorError;
use crate::leads::{Lead, Priority};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;
use tracing::{debug, warn};

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Returns true if the address looks like a deliverable e-mail address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email.trim()))
}

/// Returns a stable fingerprint of a lead's identity.
///
/// Two leads share a fingerprint when their normalised company name and
/// website match.
#[must_use]
pub fn lead_fingerprint(lead: &Lead) -> String {
    let name = lead.company_name.trim().to_lowercase();
    let website = lead
        .website
        .as_deref()
        .unwrap_or_default()
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_end_matches('/')
        .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b"|");
    hasher.update(website.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

#[allow(clippy::cast_precision_loss)]
fn fraction(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        done as f64 / total as f64
    }
}

/// Scrapes from an in-memory catalog.
///
/// Without a catalog the seeded lead set is used as the scrape output.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScraper {
    catalog: Option<Vec<Lead>>,
    unreachable: HashSet<String>,
    blocked: HashMap<String, String>,
}

impl InMemoryScraper {
    /// Creates a scraper over the seeded lead set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the lead set from a fixed catalog on every scrape.
    #[must_use]
    pub fn with_catalog(mut self, leads: Vec<Lead>) -> Self {
        self.catalog = Some(leads);
        self
    }

    /// Marks a source as unreachable.
    #[must_use]
    pub fn with_unreachable(mut self, source: impl Into<String>) -> Self {
        self.unreachable.insert(source.into());
        self
    }

    /// Marks a source as refusing access.
    #[must_use]
    pub fn with_blocked(mut self, source: impl Into<String>, reason: impl Into<String>) -> Self {
        self.blocked.insert(source.into(), reason.into());
        self
    }
}

#[async_trait]
impl Scraper for InMemoryScraper {
    async fn scrape(&self, ctx: &StageContext) -> Result<ScrapeResult, CollaboratorError> {
        let target = &ctx.inputs().target;

        for (i, source) in target.sources.iter().enumerate() {
            if self.unreachable.contains(source) {
                return Err(CollaboratorError::unreachable(source.clone()));
            }
            if let Some(reason) = self.blocked.get(source) {
                return Err(CollaboratorError::blocked(source.clone(), reason.clone()));
            }
            ctx.report_progress(fraction(i + 1, target.sources.len()) * 0.9);
        }

        if let Some(catalog) = &self.catalog {
            ctx.inputs().leads.replace(catalog.clone());
        }

        let total = ctx.inputs().leads.len();
        if total == 0 {
            return Err(CollaboratorError::NoDataFound);
        }

        debug!(target = %target.name, total, "Scrape collected leads");
        Ok(ScrapeResult {
            total_leads: total as u64,
            sources: target.sources.clone(),
        })
    }
}

/// Applies the pipeline's `FilterSpec` to the lead set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateFilter {
    reference_time: Option<DateTime<Utc>>,
}

impl PredicateFilter {
    /// Creates a filter that measures freshness against the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the time freshness is measured against.
    #[must_use]
    pub fn with_reference_time(mut self, at: DateTime<Utc>) -> Self {
        self.reference_time = Some(at);
        self
    }
}

#[async_trait]
impl LeadFilter for PredicateFilter {
    async fn filter(&self, ctx: &StageContext) -> Result<FilterResult, CollaboratorError> {
        ctx.results().require_scrape()?;

        let now = self.reference_time.unwrap_or_else(Utc::now);
        let leads = ctx.inputs().leads.snapshot();
        let outcome = ctx.inputs().filter.apply(&leads, now);

        let result = FilterResult {
            filtered_leads: outcome.kept.len() as u64,
            removed_leads: outcome.removed as u64,
            applied_filters: outcome.applied_filters,
        };
        ctx.inputs().leads.replace(outcome.kept);
        ctx.report_progress(1.0);

        Ok(result)
    }
}

/// An in-memory CRM that stores synced records per destination.
///
/// Leads are assigned round-robin across connected destinations. Leads with
/// no usable contact e-mail are refused and counted as failed.
#[derive(Debug, Default)]
pub struct InMemoryCrm {
    records: DashMap<String, Vec<Lead>>,
}

impl InMemoryCrm {
    /// Creates an empty CRM.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records stored for a destination.
    #[must_use]
    pub fn records(&self, destination: &str) -> Vec<Lead> {
        self.records
            .get(destination)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns the number of records across all destinations.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.records.iter().map(|entry| entry.value().len()).sum()
    }
}

#[async_trait]
impl CrmSync for InMemoryCrm {
    async fn sync(&self, ctx: &StageContext) -> Result<SyncResult, CollaboratorError> {
        ctx.results().require_qualify()?;

        let destinations: Vec<_> = ctx.inputs().connected_destinations().collect();
        if destinations.is_empty() {
            return Err(CollaboratorError::rejected("no connected CRM destinations"));
        }

        let leads = ctx.inputs().leads.snapshot();
        let total = leads.len();
        let mut per_destination_counts: BTreeMap<String, u64> = destinations
            .iter()
            .map(|d| (d.id.clone(), 0))
            .collect();
        let mut synced = Vec::with_capacity(leads.len());
        let mut failed_sync = 0u64;

        for (i, lead) in leads.into_iter().enumerate() {
            let deliverable = lead.contact_email.as_deref().is_some_and(|e| !e.trim().is_empty());
            if deliverable {
                let destination = destinations[synced.len() % destinations.len()];
                self.records
                    .entry(destination.id.clone())
                    .or_default()
                    .push(lead.clone());
                *per_destination_counts.entry(destination.id.clone()).or_default() += 1;
                synced.push(lead);
            } else {
                warn!(lead = %lead.company_name, "Lead has no contact email, sync refused");
                failed_sync += 1;
            }
            ctx.report_progress(fraction(i + 1, total));
        }

        let result = SyncResult {
            synced_leads: synced.len() as u64,
            per_destination_counts,
            failed_sync,
        };
        ctx.inputs().leads.replace(synced);

        Ok(result)
    }
}

/// Scores data quality from fingerprints, completeness and e-mail validity.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintQualityChecker;

impl FingerprintQualityChecker {
    /// Creates a checker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Checks a lead collection.
    #[must_use]
    pub fn check_leads(&self, leads: &[Lead]) -> QualityResult {
        let mut seen = HashSet::new();
        let mut result = QualityResult::default();

        for lead in leads {
            let duplicate = !seen.insert(lead_fingerprint(lead));
            let missing = lead.has_missing_data();
            let invalid_email = lead
                .contact_email
                .as_deref()
                .is_some_and(|email| !is_valid_email(email));

            if duplicate {
                result.duplicates_found += 1;
            }
            if missing {
                result.missing_data += 1;
            }
            if invalid_email {
                result.invalid_emails += 1;
            }
            if !duplicate && !missing && !invalid_email {
                result.enriched_records += 1;
            }
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let score = if leads.is_empty() {
            100
        } else {
            (result.enriched_records as f64 / leads.len() as f64 * 100.0).round() as u8
        };
        result.quality_score = score;
        result
    }
}

#[async_trait]
impl QualityChecker for FingerprintQualityChecker {
    async fn check(&self, ctx: &StageContext) -> Result<QualityResult, CollaboratorError> {
        ctx.results().require_sync()?;

        let leads = ctx.inputs().leads.snapshot();
        let result = self.check_leads(&leads);
        ctx.report_progress(1.0);

        Ok(result)
    }
}

/// Summarises prior results into reports and alerts.
///
/// One report is produced per prior stage result. Alerts are raised for
/// high-priority leads, failed syncs, duplicates and a quality score below
/// the threshold.
#[derive(Debug, Clone, Copy)]
pub struct SummaryReporter {
    quality_alert_threshold: u8,
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self {
            quality_alert_threshold: 80,
        }
    }
}

impl SummaryReporter {
    /// Creates a reporter with the default quality threshold (80).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quality score below which an alert is raised.
    #[must_use]
    pub fn with_quality_alert_threshold(mut self, threshold: u8) -> Self {
        self.quality_alert_threshold = threshold;
        self
    }
}

#[async_trait]
impl Reporter for SummaryReporter {
    async fn report(&self, ctx: &StageContext) -> Result<ReportResult, CollaboratorError> {
        let results = ctx.results();
        let quality = results.require_quality()?;

        let mut alerts = 0u64;
        if results.qualify().is_some_and(|q| q.high_priority > 0) {
            alerts += 1;
        }
        if results.sync().is_some_and(|s| s.failed_sync > 0) {
            alerts += 1;
        }
        if quality.duplicates_found > 0 {
            alerts += 1;
        }
        if quality.quality_score < self.quality_alert_threshold {
            alerts += 1;
        }

        let high_priority_leads = ctx
            .inputs()
            .leads
            .snapshot()
            .iter()
            .filter(|l| l.priority == Some(Priority::High))
            .count();
        debug!(
            reports = results.len(),
            alerts,
            high_priority_leads,
            "Report summary generated"
        );
        ctx.report_progress(1.0);

        Ok(ReportResult {
            reports_generated: results.len() as u64,
            dashboard_updated: true,
            alerts_sent: alerts,
        })
    }
}
