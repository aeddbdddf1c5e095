//! Test fixtures for lead pipelines.

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use super::ScriptedStage;
use crate::context::{CrmDestination, PipelineInputs};
use crate::core::StageKind;
use crate::leads::Lead;
use crate::pipeline::{PipelineBuilder, PipelineDefinition, StageSpec};

fn updated(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Returns the six sample leads.
#[must_use]
pub fn mock_leads() -> Vec<Lead> {
    vec![
        Lead::new("1", "TechCorp Solutions", "Technology")
            .with_location("San Francisco, CA")
            .with_employees(250)
            .with_revenue(15_000_000)
            .with_description("AI-powered software solutions built on machine learning for enterprise clients")
            .with_website("https://techcorp.com")
            .with_contact_email("contact@techcorp.com")
            .with_founding_year(2018)
            .with_technologies(["AI", "Machine Learning", "Cloud Computing"])
            .with_qualification_score(85)
            .with_last_updated(updated(15)),
        Lead::new("2", "HealthTech Dynamics", "Healthcare")
            .with_location("Boston, MA")
            .with_employees(450)
            .with_revenue(25_000_000)
            .with_description("Digital health platform for hospital workflow automation")
            .with_website("https://healthtechdynamics.com")
            .with_contact_email("info@healthtechdynamics.com")
            .with_founding_year(2019)
            .with_technologies(["Healthcare", "Cloud Computing", "AI"])
            .with_qualification_score(72)
            .with_last_updated(updated(14)),
        Lead::new("3", "RetailMax Analytics", "Retail")
            .with_location("Chicago, IL")
            .with_employees(1200)
            .with_revenue(45_000_000)
            .with_description("Retail analytics and inventory forecasting powered by machine learning")
            .with_website("https://retailmax.com")
            .with_contact_email("sales@retailmax.com")
            .with_founding_year(2017)
            .with_technologies(["Data Analytics", "Machine Learning"])
            .with_qualification_score(82)
            .with_last_updated(updated(16)),
        Lead::new("4", "GreenEnergy Innovations", "Energy")
            .with_location("Austin, TX")
            .with_employees(85)
            .with_revenue(8_000_000)
            .with_description("Renewable energy management with connected grid sensors")
            .with_website("https://greenenergy.io")
            .with_contact_email("hello@greenenergy.io")
            .with_founding_year(2020)
            .with_technologies(["IoT", "Cloud Computing"])
            .with_qualification_score(88)
            .with_last_updated(updated(12)),
        Lead::new("5", "FinanceFlow Systems", "Finance")
            .with_location("New York, NY")
            .with_employees(150)
            .with_revenue(32_000_000)
            .with_description("Payment infrastructure for mid-market banks")
            .with_website("https://financeflow.com")
            .with_contact_email("partners@financeflow.com")
            .with_founding_year(2016)
            .with_technologies(["Blockchain", "Cloud Computing"])
            .with_qualification_score(79)
            .with_last_updated(updated(13)),
        Lead::new("6", "EduLearn Platform", "Education")
            .with_location("Seattle, WA")
            .with_employees(35)
            .with_revenue(3_200_000)
            .with_description("Online courses personalised with machine learning")
            .with_website("https://edulearn.com")
            .with_contact_email("team@edulearn.com")
            .with_founding_year(2021)
            .with_technologies(["AI", "EdTech", "Machine Learning"])
            .with_qualification_score(65)
            .with_last_updated(updated(11)),
    ]
}

/// Returns inputs seeded with [`mock_leads`] and two connected CRM destinations.
#[must_use]
pub fn mock_inputs() -> PipelineInputs {
    PipelineInputs::new()
        .with_leads(mock_leads())
        .with_destination(CrmDestination::new("salesforce", "Salesforce"))
        .with_destination(CrmDestination::new("hubspot", "HubSpot"))
}

/// Builds a definition of the first `stages` kinds, each backed by a
/// [`ScriptedStage`] that succeeds with the reference result.
///
/// # Panics
///
/// Panics if `stages` is zero or greater than six.
#[must_use]
pub fn reference_definition(stages: usize) -> PipelineDefinition {
    assert!(
        (1..=StageKind::ALL.len()).contains(&stages),
        "reference definitions have 1 to 6 stages, got {stages}"
    );
    StageKind::ALL[..stages]
        .iter()
        .try_fold(PipelineBuilder::new("reference"), |builder, kind| {
            builder.add_stage_spec(StageSpec::new(Arc::new(ScriptedStage::succeeding(*kind))))
        })
        .and_then(PipelineBuilder::build)
        .unwrap_or_else(|e| panic!("reference definition is valid: {e}"))
}
