//! Qualification criteria and thresholds.

use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::leads::Priority;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A scoring criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Employee count.
    CompanySize,
    /// Annual revenue.
    Revenue,
    /// Overlap with the target technology list.
    TechnologyFit,
    /// Web presence, reachable contact and track record.
    MarketPresence,
    /// Company maturity; younger companies score higher.
    GrowthStage,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompanySize => write!(f, "company_size"),
            Self::Revenue => write!(f, "revenue"),
            Self::TechnologyFit => write!(f, "technology_fit"),
            Self::MarketPresence => write!(f, "market_presence"),
            Self::GrowthStage => write!(f, "growth_stage"),
        }
    }
}

/// A criterion with its weight and enabled flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionWeight {
    /// The criterion.
    pub criterion: Criterion,
    /// Relative weight; only the ratio between enabled weights matters.
    pub weight: f64,
    /// Whether the criterion contributes to the score.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl CriterionWeight {
    /// Creates an enabled criterion weight.
    #[must_use]
    pub fn new(criterion: Criterion, weight: f64) -> Self {
        Self {
            criterion,
            weight,
            enabled: true,
        }
    }

    /// Disables the criterion.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Qualification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationConfig {
    /// Weighted criteria.
    #[serde(default = "default_criteria")]
    pub criteria: Vec<CriterionWeight>,
    /// Leads scoring below this are not qualified.
    #[serde(default = "default_min_score")]
    pub min_score: u8,
    /// Scores at or above this are high priority.
    #[serde(default = "default_high_threshold")]
    pub high_priority_threshold: u8,
    /// Scores at or above this are medium priority.
    #[serde(default = "default_medium_threshold")]
    pub medium_priority_threshold: u8,
    /// Technologies that count toward technology fit.
    #[serde(default = "default_target_technologies")]
    pub target_technologies: Vec<String>,
    /// Year used for age-based criteria; the current year when unset.
    #[serde(default)]
    pub reference_year: Option<i32>,
}

fn default_criteria() -> Vec<CriterionWeight> {
    vec![
        CriterionWeight::new(Criterion::CompanySize, 25.0),
        CriterionWeight::new(Criterion::Revenue, 30.0),
        CriterionWeight::new(Criterion::TechnologyFit, 20.0),
        CriterionWeight::new(Criterion::MarketPresence, 15.0),
        CriterionWeight::new(Criterion::GrowthStage, 10.0),
    ]
}

fn default_min_score() -> u8 {
    40
}

fn default_high_threshold() -> u8 {
    80
}

fn default_medium_threshold() -> u8 {
    60
}

fn default_target_technologies() -> Vec<String> {
    ["AI", "Machine Learning", "Cloud Computing", "Healthcare"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for QualificationConfig {
    fn default() -> Self {
        Self {
            criteria: default_criteria(),
            min_score: default_min_score(),
            high_priority_threshold: default_high_threshold(),
            medium_priority_threshold: default_medium_threshold(),
            target_technologies: default_target_technologies(),
            reference_year: None,
        }
    }
}

impl QualificationConfig {
    /// Creates a configuration with the default criteria.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the criteria.
    #[must_use]
    pub fn with_criteria(mut self, criteria: impl IntoIterator<Item = CriterionWeight>) -> Self {
        self.criteria = criteria.into_iter().collect();
        self
    }

    /// Sets the minimum qualifying score.
    #[must_use]
    pub fn with_min_score(mut self, score: u8) -> Self {
        self.min_score = score;
        self
    }

    /// Sets the priority thresholds.
    #[must_use]
    pub fn with_priority_thresholds(mut self, high: u8, medium: u8) -> Self {
        self.high_priority_threshold = high;
        self.medium_priority_threshold = medium;
        self
    }

    /// Sets the target technologies.
    #[must_use]
    pub fn with_target_technologies(mut self, technologies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.target_technologies = technologies.into_iter().map(Into::into).collect();
        self
    }

    /// Pins the year used for age-based criteria.
    #[must_use]
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Returns the enabled criteria.
    pub fn enabled(&self) -> impl Iterator<Item = &CriterionWeight> {
        self.criteria.iter().filter(|c| c.enabled)
    }

    /// Returns the sum of enabled weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.enabled().map(|c| c.weight).sum()
    }

    /// Maps a qualifying score to its priority band.
    #[must_use]
    pub fn priority_for(&self, score: u8) -> Priority {
        if score >= self.high_priority_threshold {
            Priority::High
        } else if score >= self.medium_priority_threshold {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Validates weights and thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if a weight is negative or not finite, if no enabled
    /// criterion has a positive weight, or if the thresholds are out of order.
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if let Some(bad) = self
            .criteria
            .iter()
            .find(|c| !c.weight.is_finite() || c.weight < 0.0)
        {
            return Err(PipelineValidationError::new(format!(
                "Criterion '{}' has invalid weight {}",
                bad.criterion, bad.weight
            ))
            .with_error_info(
                ContractErrorInfo::new("QUALIFICATION-WEIGHTS", "Invalid criterion weight")
                    .with_fix_hint("Weights must be finite and non-negative")
                    .with_context_entry("criterion", bad.criterion.to_string()),
            ));
        }

        if self.total_weight() <= 0.0 {
            return Err(PipelineValidationError::new(
                "No enabled qualification criterion has a positive weight",
            )
            .with_error_info(
                ContractErrorInfo::new("QUALIFICATION-WEIGHTS", "No usable criteria")
                    .with_fix_hint("Enable at least one criterion with a weight above zero"),
            ));
        }

        let ordered = self.min_score <= self.medium_priority_threshold
            && self.medium_priority_threshold <= self.high_priority_threshold
            && self.high_priority_threshold <= 100;
        if !ordered {
            return Err(PipelineValidationError::new(format!(
                "Thresholds out of order: min {} / medium {} / high {}",
                self.min_score, self.medium_priority_threshold, self.high_priority_threshold
            ))
            .with_error_info(
                ContractErrorInfo::new("QUALIFICATION-THRESHOLDS", "Thresholds out of order")
                    .with_fix_hint("Require min_score <= medium <= high <= 100"),
            ));
        }

        Ok(())
    }
}
