//! Lead filter predicate set.
//!
//! Every predicate is optional: empty sets and unset bounds match everything.
//! A lead is kept only if it satisfies all active predicates.

use super::Lead;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Company-size buckets by employee count (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    /// 1–10 employees.
    Startup,
    /// 11–50 employees.
    Small,
    /// 51–200 employees.
    Medium,
    /// 201–1000 employees.
    Large,
    /// 1000+ employees.
    Enterprise,
}

impl CompanySize {
    /// Returns the inclusive employee bounds; `None` means unbounded.
    #[must_use]
    pub fn bounds(self) -> (u32, Option<u32>) {
        match self {
            Self::Startup => (1, Some(10)),
            Self::Small => (11, Some(50)),
            Self::Medium => (51, Some(200)),
            Self::Large => (201, Some(1000)),
            Self::Enterprise => (1000, None),
        }
    }

    /// Returns true if the employee count falls in this bucket.
    #[must_use]
    pub fn contains(self, employees: u32) -> bool {
        let (min, max) = self.bounds();
        employees >= min && max.map_or(true, |max| employees <= max)
    }
}

impl fmt::Display for CompanySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => write!(f, "Startup (1-10)"),
            Self::Small => write!(f, "Small (11-50)"),
            Self::Medium => write!(f, "Medium (51-200)"),
            Self::Large => write!(f, "Large (201-1000)"),
            Self::Enterprise => write!(f, "Enterprise (1000+)"),
        }
    }
}

/// Revenue buckets in dollars (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueRange {
    /// Under $1M.
    Under1M,
    /// $1M – $5M.
    From1MTo5M,
    /// $5M – $10M.
    From5MTo10M,
    /// $10M – $50M.
    From10MTo50M,
    /// Over $50M.
    Over50M,
}

impl RevenueRange {
    /// Returns the inclusive revenue bounds; `None` means unbounded.
    #[must_use]
    pub fn bounds(self) -> (u64, Option<u64>) {
        match self {
            Self::Under1M => (0, Some(1_000_000)),
            Self::From1MTo5M => (1_000_000, Some(5_000_000)),
            Self::From5MTo10M => (5_000_000, Some(10_000_000)),
            Self::From10MTo50M => (10_000_000, Some(50_000_000)),
            Self::Over50M => (50_000_000, None),
        }
    }

    /// Returns true if the revenue falls in this bucket.
    #[must_use]
    pub fn contains(self, revenue: u64) -> bool {
        let (min, max) = self.bounds();
        revenue >= min && max.map_or(true, |max| revenue <= max)
    }
}

impl fmt::Display for RevenueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Under1M => write!(f, "Under $1M"),
            Self::From1MTo5M => write!(f, "$1M - $5M"),
            Self::From5MTo10M => write!(f, "$5M - $10M"),
            Self::From10MTo50M => write!(f, "$10M - $50M"),
            Self::Over50M => write!(f, "Over $50M"),
        }
    }
}

/// An inclusive numeric range with optional ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RangeFilter<T> {
    /// Lower bound.
    #[serde(default)]
    pub min: Option<T>,
    /// Upper bound.
    #[serde(default)]
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> RangeFilter<T> {
    /// Creates a range with both ends optional.
    #[must_use]
    pub fn new(min: Option<T>, max: Option<T>) -> Self {
        Self { min, max }
    }

    /// Returns true if neither end is set.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Returns true if the value lies within the set ends.
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// The full predicate set applied by the filter stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Accepted industries.
    pub industries: Vec<String>,
    /// Accepted locations.
    pub locations: Vec<String>,
    /// Accepted company-size buckets (any match).
    pub company_sizes: Vec<CompanySize>,
    /// Accepted revenue buckets (any match).
    pub revenue_ranges: Vec<RevenueRange>,
    /// Accepted technologies (any match).
    pub technologies: Vec<String>,
    /// Keywords of which at least one must appear in the description or name.
    pub include_keywords: Vec<String>,
    /// Keywords none of which may appear in the description or name.
    pub exclude_keywords: Vec<String>,
    /// Employee count bounds.
    pub employees: RangeFilter<u32>,
    /// Revenue bounds.
    pub revenue: RangeFilter<u64>,
    /// Founding-year bounds.
    pub founding_year: RangeFilter<i32>,
    /// Qualification-score bounds.
    pub qualification_score: RangeFilter<u8>,
    /// Maximum age of a record in whole days.
    pub max_age_days: Option<i64>,
}

/// The outcome of applying a `FilterSpec` to a lead collection.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Leads that passed every predicate, in input order.
    pub kept: Vec<Lead>,
    /// Number of leads dropped.
    pub removed: usize,
    /// Labels of the active predicates.
    pub applied_filters: Vec<String>,
}

impl FilterSpec {
    /// Creates an empty predicate set that keeps everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to the given industries.
    #[must_use]
    pub fn with_industries(mut self, industries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.industries = industries.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given locations.
    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    /// Restricts to the given company-size buckets.
    #[must_use]
    pub fn with_company_sizes(mut self, sizes: impl IntoIterator<Item = CompanySize>) -> Self {
        self.company_sizes = sizes.into_iter().collect();
        self
    }

    /// Restricts to the given revenue buckets.
    #[must_use]
    pub fn with_revenue_ranges(mut self, ranges: impl IntoIterator<Item = RevenueRange>) -> Self {
        self.revenue_ranges = ranges.into_iter().collect();
        self
    }

    /// Restricts to leads using any of the given technologies.
    #[must_use]
    pub fn with_technologies(mut self, technologies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.technologies = technologies.into_iter().map(Into::into).collect();
        self
    }

    /// Requires at least one of the keywords.
    #[must_use]
    pub fn with_include_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Forbids all of the keywords.
    #[must_use]
    pub fn with_exclude_keywords(mut self, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the minimum employee count.
    #[must_use]
    pub fn with_min_employees(mut self, min: u32) -> Self {
        self.employees.min = Some(min);
        self
    }

    /// Sets the maximum employee count.
    #[must_use]
    pub fn with_max_employees(mut self, max: u32) -> Self {
        self.employees.max = Some(max);
        self
    }

    /// Sets the minimum revenue.
    #[must_use]
    pub fn with_min_revenue(mut self, min: u64) -> Self {
        self.revenue.min = Some(min);
        self
    }

    /// Sets the maximum revenue.
    #[must_use]
    pub fn with_max_revenue(mut self, max: u64) -> Self {
        self.revenue.max = Some(max);
        self
    }

    /// Sets the founding-year range.
    #[must_use]
    pub fn with_founding_year(mut self, range: RangeFilter<i32>) -> Self {
        self.founding_year = range;
        self
    }

    /// Sets the qualification-score range.
    #[must_use]
    pub fn with_qualification_score(mut self, range: RangeFilter<u8>) -> Self {
        self.qualification_score = range;
        self
    }

    /// Drops records older than `days` whole days.
    #[must_use]
    pub fn with_max_age_days(mut self, days: i64) -> Self {
        self.max_age_days = Some(days);
        self
    }

    /// Returns true if a single lead passes every active predicate.
    #[must_use]
    pub fn matches(&self, lead: &Lead, now: DateTime<Utc>) -> bool {
        if !self.industries.is_empty() && !self.industries.contains(&lead.industry) {
            return false;
        }

        if !self.locations.is_empty() && !self.locations.contains(&lead.location) {
            return false;
        }

        if !self.company_sizes.is_empty()
            && !self
                .company_sizes
                .iter()
                .any(|size| size.contains(lead.employee_count))
        {
            return false;
        }

        if !self.revenue_ranges.is_empty() {
            let Some(revenue) = lead.revenue else {
                return false;
            };
            if !self.revenue_ranges.iter().any(|range| range.contains(revenue)) {
                return false;
            }
        }

        if !self.technologies.is_empty()
            && !self
                .technologies
                .iter()
                .any(|tech| lead.technologies.contains(tech))
        {
            return false;
        }

        if !self.employees.contains(lead.employee_count) {
            return false;
        }

        if !self.revenue.is_unbounded() {
            match lead.revenue {
                Some(revenue) if self.revenue.contains(revenue) => {}
                _ => return false,
            }
        }

        if !self.founding_year.is_unbounded() {
            match lead.founding_year {
                Some(year) if self.founding_year.contains(year) => {}
                _ => return false,
            }
        }

        if !self.qualification_score.contains(lead.qualification_score) {
            return false;
        }

        let include = normalized_keywords(&self.include_keywords);
        let exclude = normalized_keywords(&self.exclude_keywords);
        if !include.is_empty() || !exclude.is_empty() {
            let haystack = format!("{} {}", lead.description, lead.company_name).to_lowercase();
            if !include.is_empty() && !include.iter().any(|k| haystack.contains(k.as_str())) {
                return false;
            }
            if exclude.iter().any(|k| haystack.contains(k.as_str())) {
                return false;
            }
        }

        if let Some(max_days) = self.max_age_days {
            let age_days = (now - lead.last_updated).num_days();
            if age_days > max_days {
                return false;
            }
        }

        true
    }

    /// Applies the predicate set to a lead collection.
    #[must_use]
    pub fn apply(&self, leads: &[Lead], now: DateTime<Utc>) -> FilterOutcome {
        let kept: Vec<Lead> = leads
            .iter()
            .filter(|lead| self.matches(lead, now))
            .cloned()
            .collect();

        FilterOutcome {
            removed: leads.len() - kept.len(),
            kept,
            applied_filters: self.labels(),
        }
    }

    /// Returns human-readable labels of the active predicates.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::new();

        if !self.industries.is_empty() {
            labels.push(format!("Industry: {}", self.industries.join(", ")));
        }
        if !self.locations.is_empty() {
            labels.push(format!("Location: {}", self.locations.join(", ")));
        }
        if !self.company_sizes.is_empty() {
            labels.push(format!("Company size: {}", join_display(&self.company_sizes)));
        }
        if !self.revenue_ranges.is_empty() {
            labels.push(format!("Revenue: {}", join_display(&self.revenue_ranges)));
        }
        if !self.technologies.is_empty() {
            labels.push(format!("Technology: {}", self.technologies.join(", ")));
        }
        if let Some(label) = range_label("Employees", &self.employees) {
            labels.push(label);
        }
        if let Some(label) = range_label("Revenue ($)", &self.revenue) {
            labels.push(label);
        }
        if let Some(label) = range_label("Founded", &self.founding_year) {
            labels.push(label);
        }
        if let Some(label) = range_label("Qualification score", &self.qualification_score) {
            labels.push(label);
        }
        let include = normalized_keywords(&self.include_keywords);
        if !include.is_empty() {
            labels.push(format!("Keywords: {}", include.join(", ")));
        }
        let exclude = normalized_keywords(&self.exclude_keywords);
        if !exclude.is_empty() {
            labels.push(format!("Excluding: {}", exclude.join(", ")));
        }
        if let Some(days) = self.max_age_days {
            labels.push(format!("Updated within {days} days"));
        }

        labels
    }
}

fn normalized_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn join_display<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn range_label<T: fmt::Display + PartialOrd + Copy>(name: &str, range: &RangeFilter<T>) -> Option<String> {
    match (range.min, range.max) {
        (None, None) => None,
        (Some(min), None) => Some(format!("{name} >= {min}")),
        (None, Some(max)) => Some(format!("{name} <= {max}")),
        (Some(min), Some(max)) => Some(format!("{name} {min}-{max}")),
    }
}
