//! Per-stage execution context.

use super::{PipelineInputs, ResultStore};
use crate::cancellation::CancellationToken;
use crate::core::{PipelineId, StageKind};
use std::sync::Arc;

type ProgressFn = dyn Fn(f64) + Send + Sync;

/// Reports a running stage's progress back to its pipeline.
///
/// Reports are clamped to `[0, 1]` by the receiving stage record; values
/// below the last accepted report and reports arriving after the stage is
/// terminal are dropped there.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    report: Option<Arc<ProgressFn>>,
}

impl ProgressReporter {
    /// Creates a reporter that forwards to the given callback.
    #[must_use]
    pub fn new(report: impl Fn(f64) + Send + Sync + 'static) -> Self {
        Self {
            report: Some(Arc::new(report)),
        }
    }

    /// Creates a reporter that discards every report.
    #[must_use]
    pub fn noop() -> Self {
        Self::default()
    }

    /// Reports progress in `[0, 1]`.
    pub fn report(&self, progress: f64) {
        if let Some(report) = &self.report {
            report(progress);
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("attached", &self.report.is_some())
            .finish()
    }
}

/// Context passed to a stage's unit of work.
#[derive(Debug, Clone)]
pub struct StageContext {
    pipeline_id: PipelineId,
    stage_name: String,
    kind: StageKind,
    index: usize,
    results: ResultStore,
    inputs: Arc<PipelineInputs>,
    progress: ProgressReporter,
    cancellation: CancellationToken,
}

impl StageContext {
    /// Creates a context with empty results, default inputs and no progress sink.
    #[must_use]
    pub fn new(pipeline_id: PipelineId, stage_name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            pipeline_id,
            stage_name: stage_name.into(),
            kind,
            index: 0,
            results: ResultStore::new(),
            inputs: Arc::new(PipelineInputs::default()),
            progress: ProgressReporter::noop(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Sets the stage position.
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Sets the prior results.
    #[must_use]
    pub fn with_results(mut self, results: ResultStore) -> Self {
        self.results = results;
        self
    }

    /// Sets the pipeline inputs.
    #[must_use]
    pub fn with_inputs(mut self, inputs: Arc<PipelineInputs>) -> Self {
        self.inputs = inputs;
        self
    }

    /// Sets the progress reporter.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the pipeline's cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the owning pipeline id.
    #[must_use]
    pub fn pipeline_id(&self) -> PipelineId {
        self.pipeline_id
    }

    /// Returns the stage name.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    /// Returns the stage kind.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Returns the stage position in the pipeline.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the results of prior stages.
    #[must_use]
    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    /// Returns the pipeline inputs.
    #[must_use]
    pub fn inputs(&self) -> &PipelineInputs {
        &self.inputs
    }

    /// Reports progress in `[0, 1]`.
    pub fn report_progress(&self, progress: f64) {
        self.progress.report(progress);
    }

    /// Returns true once the pipeline has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns the pipeline's cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}
