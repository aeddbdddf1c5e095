//! Criterion scoring and the in-memory qualifier.

use super::{Criterion, QualificationConfig};
use crate::collaborators::Qualifier;
use crate::context::StageContext;
use crate::core::QualificationResult;
use crate::errors::{CollaboratorError, PipelineValidationError};
use crate::leads::{Lead, Priority};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// The score breakdown for one lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadScore {
    /// The lead id.
    pub lead_id: String,
    /// The company name.
    pub company_name: String,
    /// Weighted overall score in `0..=100`.
    pub overall_score: u8,
    /// Per-criterion scores for enabled criteria.
    pub criteria_scores: BTreeMap<Criterion, u8>,
    /// Priority band, or `None` if the lead did not qualify.
    pub priority: Option<Priority>,
}

impl LeadScore {
    /// Returns true if the lead qualified.
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.priority.is_some()
    }
}

/// Scores leads against weighted criteria.
#[derive(Debug, Clone)]
pub struct WeightedQualifier {
    config: QualificationConfig,
}

impl WeightedQualifier {
    /// Creates a qualifier from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation error if the configuration is rejected.
    pub fn new(config: QualificationConfig) -> Result<Self, PipelineValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &QualificationConfig {
        &self.config
    }

    fn reference_year(&self) -> i32 {
        self.config.reference_year.unwrap_or_else(|| Utc::now().year())
    }

    /// Scores a single criterion.
    #[must_use]
    pub fn criterion_score(&self, criterion: Criterion, lead: &Lead) -> u8 {
        match criterion {
            Criterion::CompanySize => match lead.employee_count {
                0 => 0,
                1..=10 => 30,
                11..=50 => 45,
                51..=200 => 65,
                201..=1000 => 80,
                _ => 90,
            },
            Criterion::Revenue => match lead.revenue {
                None => 0,
                Some(r) if r < 1_000_000 => 30,
                Some(r) if r < 5_000_000 => 60,
                Some(r) if r < 10_000_000 => 70,
                Some(r) if r <= 50_000_000 => 90,
                Some(_) => 95,
            },
            Criterion::TechnologyFit => self.technology_fit(lead),
            Criterion::MarketPresence => {
                let mut score = 0u8;
                if lead.website.is_some() {
                    score += 40;
                }
                if lead.contact_email.is_some() {
                    score += 20;
                }
                match self.company_age(lead) {
                    Some(age) if age >= 5 => score += 40,
                    Some(age) if age >= 2 => score += 20,
                    _ => {}
                }
                score
            }
            Criterion::GrowthStage => match self.company_age(lead) {
                None => 50,
                Some(age) if age <= 3 => 95,
                Some(age) if age <= 7 => 85,
                Some(age) if age <= 15 => 65,
                Some(_) => 45,
            },
        }
    }

    fn company_age(&self, lead: &Lead) -> Option<i32> {
        lead.founding_year
            .map(|year| (self.reference_year() - year).max(0))
    }

    fn technology_fit(&self, lead: &Lead) -> u8 {
        let targets = &self.config.target_technologies;
        if targets.is_empty() {
            return 50;
        }
        let matched = targets
            .iter()
            .filter(|target| {
                lead.technologies
                    .iter()
                    .any(|tech| tech.eq_ignore_ascii_case(target))
            })
            .count();
        u8::try_from(matched * 100 / targets.len()).unwrap_or(100)
    }

    /// Scores a lead over every enabled criterion.
    #[must_use]
    pub fn score(&self, lead: &Lead) -> LeadScore {
        let total_weight = self.config.total_weight();
        let mut criteria_scores = BTreeMap::new();
        let mut weighted = 0.0;

        for entry in self.config.enabled() {
            let score = self.criterion_score(entry.criterion, lead);
            criteria_scores.insert(entry.criterion, score);
            weighted += f64::from(score) * entry.weight;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let overall_score = if total_weight > 0.0 {
            (weighted / total_weight).round().clamp(0.0, 100.0) as u8
        } else {
            0
        };

        let priority = (overall_score >= self.config.min_score)
            .then(|| self.config.priority_for(overall_score));

        LeadScore {
            lead_id: lead.id.clone(),
            company_name: lead.company_name.clone(),
            overall_score,
            criteria_scores,
            priority,
        }
    }

    /// Scores every lead, keeping only qualified ones annotated with score
    /// and priority.
    #[must_use]
    pub fn qualify_leads(&self, leads: &[Lead]) -> (Vec<Lead>, QualificationResult) {
        let mut result = QualificationResult::default();
        let mut kept = Vec::with_capacity(leads.len());

        for lead in leads {
            let score = self.score(lead);
            let Some(priority) = score.priority else {
                debug!(lead = %lead.company_name, score = score.overall_score, "Lead not qualified");
                continue;
            };

            match priority {
                Priority::High => result.high_priority += 1,
                Priority::Medium => result.medium_priority += 1,
                Priority::Low => result.low_priority += 1,
            }
            result.qualified_leads += 1;

            let mut lead = lead.clone().with_qualification_score(score.overall_score);
            lead.priority = Some(priority);
            kept.push(lead);
        }

        (kept, result)
    }
}

#[async_trait]
impl Qualifier for WeightedQualifier {
    async fn qualify(&self, ctx: &StageContext) -> Result<QualificationResult, CollaboratorError> {
        ctx.results().require_filter()?;

        let leads = ctx.inputs().leads.snapshot();
        let (kept, result) = self.qualify_leads(&leads);
        ctx.inputs().leads.replace(kept);
        ctx.report_progress(1.0);

        Ok(result)
    }
}
