//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::collaborators::reference_result;
use crate::context::StageContext;
use crate::core::{PipelineId, StageKind, StageResult};
use crate::errors::{CollaboratorError, StageFailure};
use crate::stages::Stage;

#[derive(Debug, Clone)]
enum Outcome {
    Succeed(StageResult),
    Fail(CollaboratorError),
}

/// A stage whose outcome, progress reports and timing are scripted.
///
/// Runs in this order: reports each progress step, waits for the gate (if
/// any), sleeps for the delay (if any), then returns the scripted outcome.
#[derive(Debug)]
pub struct ScriptedStage {
    name: String,
    kind: StageKind,
    outcome: Outcome,
    progress: Vec<f64>,
    gate: Option<Arc<Notify>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<PipelineId>>,
}

impl ScriptedStage {
    fn with_outcome(kind: StageKind, outcome: Outcome) -> Self {
        Self {
            name: kind.to_string(),
            kind,
            outcome,
            progress: Vec::new(),
            gate: None,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Creates a stage that succeeds with the reference result of its kind.
    #[must_use]
    pub fn succeeding(kind: StageKind) -> Self {
        Self::with_outcome(kind, Outcome::Succeed(reference_result(kind)))
    }

    /// Creates a stage that fails with `error`.
    #[must_use]
    pub fn failing(kind: StageKind, error: CollaboratorError) -> Self {
        Self::with_outcome(kind, Outcome::Fail(error))
    }

    /// Overrides the stage name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Succeeds with `result` instead.
    #[must_use]
    pub fn with_result(mut self, result: StageResult) -> Self {
        self.outcome = Outcome::Succeed(result);
        self
    }

    /// Succeeds with the reference result of another kind.
    #[must_use]
    pub fn with_result_of(self, kind: StageKind) -> Self {
        self.with_result(reference_result(kind))
    }

    /// Reports these progress values before finishing.
    #[must_use]
    pub fn with_progress(mut self, steps: impl IntoIterator<Item = f64>) -> Self {
        self.progress = steps.into_iter().collect();
        self
    }

    /// Blocks after reporting progress until `gate` is notified.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sleeps for `delay` before finishing.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of times the stage ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the pipelines the stage ran for, in order.
    #[must_use]
    pub fn seen_pipelines(&self) -> Vec<PipelineId> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Stage for ScriptedStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, ctx: &StageContext) -> Result<StageResult, StageFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(ctx.pipeline_id());

        for step in &self.progress {
            ctx.report_progress(*step);
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.outcome {
            Outcome::Succeed(result) => Ok(result.clone()),
            Outcome::Fail(error) => Err(StageFailure::new(ctx.stage_name(), error.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(kind: StageKind) -> StageContext {
        StageContext::new(PipelineId::new(), kind.to_string(), kind)
    }

    #[tokio::test]
    async fn test_succeeding_stage_returns_reference_result() {
        let stage = ScriptedStage::succeeding(StageKind::Scrape);
        let result = stage.run(&ctx(StageKind::Scrape)).await.unwrap();

        assert_eq!(stage.name(), "scrape");
        assert_eq!(result.as_scrape().map(|r| r.total_leads), Some(2847));
        assert_eq!(stage.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_stage_names_itself() {
        let stage = ScriptedStage::failing(StageKind::Filter, CollaboratorError::rejected("no"))
            .with_name("narrow");
        let ctx = StageContext::new(PipelineId::new(), "narrow", StageKind::Filter);

        let err = stage.run(&ctx).await.unwrap_err();
        assert_eq!(err.stage, "narrow");
        assert_eq!(stage.seen_pipelines(), vec![ctx.pipeline_id()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_holds_stage() {
        let gate = Arc::new(Notify::new());
        let stage = Arc::new(ScriptedStage::succeeding(StageKind::Scrape).with_gate(gate.clone()));

        let task = tokio::spawn({
            let stage = stage.clone();
            async move { stage.run(&ctx(StageKind::Scrape)).await }
        });
        tokio::task::yield_now().await;
        assert!(!task.is_finished());

        gate.notify_one();
        assert!(task.await.unwrap().is_ok());
    }
}
