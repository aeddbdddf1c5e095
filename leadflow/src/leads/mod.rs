//! Lead records and the per-pipeline working set.
//!
//! This module provides:
//! - The flat `Lead` record that flows between in-memory collaborators
//! - `LeadSet`, the mutable collection a pipeline narrows stage by stage
//! - The filter predicate set (`FilterSpec`)

mod filter;

pub use filter::{CompanySize, FilterOutcome, FilterSpec, RangeFilter, RevenueRange};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Priority band assigned by qualification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Score at or above the high threshold.
    High,
    /// Score at or above the medium threshold.
    Medium,
    /// Qualified, but below the medium threshold.
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// A single company lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    /// Stable identifier.
    pub id: String,
    /// Company name.
    pub company_name: String,
    /// Industry label (e.g. "Technology").
    pub industry: String,
    /// Location label (e.g. "San Francisco, CA").
    #[serde(default)]
    pub location: String,
    /// Number of employees.
    #[serde(default)]
    pub employee_count: u32,
    /// Annual revenue in dollars, when known.
    #[serde(default)]
    pub revenue: Option<u64>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Company website.
    #[serde(default)]
    pub website: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Year the company was founded.
    #[serde(default)]
    pub founding_year: Option<i32>,
    /// Technologies the company uses.
    #[serde(default)]
    pub technologies: Vec<String>,
    /// Qualification score in `0..=100`.
    #[serde(default)]
    pub qualification_score: u8,
    /// Priority band, once qualified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// When the record was last refreshed.
    pub last_updated: DateTime<Utc>,
}

impl Lead {
    /// Creates a lead with only its identity set.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        company_name: impl Into<String>,
        industry: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            company_name: company_name.into(),
            industry: industry.into(),
            location: String::new(),
            employee_count: 0,
            revenue: None,
            description: String::new(),
            website: None,
            contact_email: None,
            founding_year: None,
            technologies: Vec::new(),
            qualification_score: 0,
            priority: None,
            last_updated: Utc::now(),
        }
    }

    /// Sets the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Sets the employee count.
    #[must_use]
    pub fn with_employees(mut self, count: u32) -> Self {
        self.employee_count = count;
        self
    }

    /// Sets the annual revenue.
    #[must_use]
    pub fn with_revenue(mut self, revenue: u64) -> Self {
        self.revenue = Some(revenue);
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the website.
    #[must_use]
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Sets the contact email.
    #[must_use]
    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    /// Sets the founding year.
    #[must_use]
    pub fn with_founding_year(mut self, year: i32) -> Self {
        self.founding_year = Some(year);
        self
    }

    /// Sets the technologies.
    #[must_use]
    pub fn with_technologies(mut self, technologies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.technologies = technologies.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the qualification score, clamped to 100.
    #[must_use]
    pub fn with_qualification_score(mut self, score: u8) -> Self {
        self.qualification_score = score.min(100);
        self
    }

    /// Sets the last-updated timestamp.
    #[must_use]
    pub fn with_last_updated(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = at;
        self
    }

    /// Returns true if a key field (location, revenue, email) is missing.
    #[must_use]
    pub fn has_missing_data(&self) -> bool {
        self.location.trim().is_empty()
            || self.revenue.is_none()
            || self
                .contact_email
                .as_deref()
                .map_or(true, |email| email.trim().is_empty())
    }
}

/// The mutable lead collection a pipeline works on.
///
/// Cloning shares the same underlying collection. Each pipeline gets its own
/// set, so no lead data is shared between pipeline instances.
#[derive(Debug, Clone, Default)]
pub struct LeadSet {
    inner: Arc<RwLock<Vec<Lead>>>,
}

impl LeadSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set seeded with leads.
    #[must_use]
    pub fn from_leads(leads: Vec<Lead>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(leads)),
        }
    }

    /// Returns a copy of the current leads.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Lead> {
        self.inner.read().clone()
    }

    /// Replaces the current leads.
    pub fn replace(&self, leads: Vec<Lead>) {
        *self.inner.write() = leads;
    }

    /// Returns the number of leads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Creates an independent copy holding the same leads.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self::from_leads(self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_builder() {
        let lead = Lead::new("1", "TechCorp Solutions", "Technology")
            .with_location("San Francisco, CA")
            .with_employees(250)
            .with_revenue(15_000_000)
            .with_contact_email("contact@techcorp.com")
            .with_qualification_score(250);

        assert_eq!(lead.employee_count, 250);
        assert_eq!(lead.revenue, Some(15_000_000));
        assert_eq!(lead.qualification_score, 100);
        assert!(!lead.has_missing_data());
    }

    #[test]
    fn test_missing_data_detection() {
        let lead = Lead::new("1", "Acme", "Retail").with_location("Chicago, IL");
        assert!(lead.has_missing_data());

        let lead = lead.with_revenue(1_000).with_contact_email("   ");
        assert!(lead.has_missing_data());
    }

    #[test]
    fn test_lead_set_shares_between_clones() {
        let set = LeadSet::new();
        let alias = set.clone();
        alias.replace(vec![Lead::new("1", "Acme", "Retail")]);

        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_lead_set_deep_clone_is_independent() {
        let set = LeadSet::from_leads(vec![Lead::new("1", "Acme", "Retail")]);
        let copy = set.deep_clone();
        copy.replace(Vec::new());

        assert_eq!(set.len(), 1);
        assert!(copy.is_empty());
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&Priority::High).unwrap(), r#""high""#);
        assert_eq!(Priority::Low.to_string(), "low");
    }
}
