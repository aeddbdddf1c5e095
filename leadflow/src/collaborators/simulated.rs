//! Simulated collaborators.
//!
//! Each stage waits its configured duration, ticking progress by a random
//! increment, then returns the fixed reference result for its kind.

use super::{
    reference_result, CrmSync, LeadFilter, QualityChecker, Qualifier, Reporter, Scraper,
};
use crate::config::SimulationConfig;
use crate::context::StageContext;
use crate::core::{
    FilterResult, QualificationResult, QualityResult, ReportResult, ScrapeResult, StageKind,
    StageResult, SyncResult,
};
use crate::errors::CollaboratorError;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Implements every collaborator port with timed, fixed results.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCollaborators {
    config: SimulationConfig,
}

impl SimulatedCollaborators {
    /// Creates simulated collaborators.
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    async fn simulate(&self, ctx: &StageContext, kind: StageKind) -> StageResult {
        let duration = self.config.duration_for(kind);
        let tick = self.config.tick_interval().max(Duration::from_millis(1));
        let max_increment = self.config.max_progress_increment;
        let started = Instant::now();
        let mut progress = 0.0_f64;

        loop {
            let remaining = duration.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(tick.min(remaining)).await;
            if started.elapsed() >= duration {
                break;
            }

            let increment = if max_increment > 0.0 {
                rand::thread_rng().gen_range(0.0..max_increment)
            } else {
                0.0
            };
            progress = (progress + increment).min(1.0);
            trace!(stage = %ctx.stage_name(), progress, "Simulated tick");
            ctx.report_progress(progress);
        }

        reference_result(kind)
    }
}

#[async_trait]
impl Scraper for SimulatedCollaborators {
    async fn scrape(&self, ctx: &StageContext) -> Result<ScrapeResult, CollaboratorError> {
        match self.simulate(ctx, StageKind::Scrape).await {
            StageResult::Scrape(result) => Ok(result),
            other => Err(mismatch(StageKind::Scrape, &other)),
        }
    }
}

#[async_trait]
impl LeadFilter for SimulatedCollaborators {
    async fn filter(&self, ctx: &StageContext) -> Result<FilterResult, CollaboratorError> {
        match self.simulate(ctx, StageKind::Filter).await {
            StageResult::Filter(result) => Ok(result),
            other => Err(mismatch(StageKind::Filter, &other)),
        }
    }
}

#[async_trait]
impl Qualifier for SimulatedCollaborators {
    async fn qualify(&self, ctx: &StageContext) -> Result<QualificationResult, CollaboratorError> {
        match self.simulate(ctx, StageKind::Qualify).await {
            StageResult::Qualify(result) => Ok(result),
            other => Err(mismatch(StageKind::Qualify, &other)),
        }
    }
}

#[async_trait]
impl CrmSync for SimulatedCollaborators {
    async fn sync(&self, ctx: &StageContext) -> Result<SyncResult, CollaboratorError> {
        match self.simulate(ctx, StageKind::Sync).await {
            StageResult::Sync(result) => Ok(result),
            other => Err(mismatch(StageKind::Sync, &other)),
        }
    }
}

#[async_trait]
impl QualityChecker for SimulatedCollaborators {
    async fn check(&self, ctx: &StageContext) -> Result<QualityResult, CollaboratorError> {
        match self.simulate(ctx, StageKind::Quality).await {
            StageResult::Quality(result) => Ok(result),
            other => Err(mismatch(StageKind::Quality, &other)),
        }
    }
}

#[async_trait]
impl Reporter for SimulatedCollaborators {
    async fn report(&self, ctx: &StageContext) -> Result<ReportResult, CollaboratorError> {
        match self.simulate(ctx, StageKind::Report).await {
            StageResult::Report(result) => Ok(result),
            other => Err(mismatch(StageKind::Report, &other)),
        }
    }
}

fn mismatch(expected: StageKind, actual: &StageResult) -> CollaboratorError {
    CollaboratorError::ResultKindMismatch {
        expected,
        actual: actual.kind(),
    }
}
