//! Pipeline execution.
//!
//! Each pipeline runs on its own tokio task. State transitions happen under
//! the pipeline's write lock; the events describing them are built there and
//! emitted after the lock is released, while an emission lock is held. Events
//! therefore reach observers in transition order, no progress follows a
//! stage's `StageFinished`, and a sink may read the pipeline back.

use super::{PipelineDefinition, PipelineSnapshot, PipelineState, StageSpec};
use crate::cancellation::CancellationToken;
use crate::context::{PipelineInputs, ProgressReporter, StageContext};
use crate::core::{PipelineEvent, PipelineId, PipelineStatus, StageResult, StageStatus};
use crate::errors::{CollaboratorError, InvalidTransitionError, StageFailure};
use crate::events::EventSink;
use crate::observability::{pipeline_span, stage_span, SpanTimer};
use chrono::Utc;
use futures::FutureExt;
use parking_lot::{ReentrantMutex, RwLock};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Instrument};

/// Shared handle to one pipeline's state.
///
/// Held by the orchestrator and by the pipeline's task.
pub struct PipelineHandle {
    state: RwLock<PipelineState>,
    emission: ReentrantMutex<()>,
    status: watch::Sender<PipelineStatus>,
    token: CancellationToken,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("PipelineHandle")
            .field("id", &state.id())
            .field("status", &state.status())
            .finish_non_exhaustive()
    }
}

impl PipelineHandle {
    /// Creates a running pipeline.
    ///
    /// Nothing is emitted until [`PipelineHandle::announce`].
    #[must_use]
    pub fn new(id: PipelineId, definition: &PipelineDefinition, sink: Arc<dyn EventSink>) -> Arc<Self> {
        let state = PipelineState::new(id, definition);
        let (status, _) = watch::channel(state.status());
        Arc::new(Self {
            state: RwLock::new(state),
            emission: ReentrantMutex::new(()),
            status,
            token: CancellationToken::new(),
            sink,
        })
    }

    /// Emits `PipelineStarted`.
    ///
    /// Called once the pipeline can be looked up by its id.
    pub fn announce(&self, definition: &PipelineDefinition) {
        let _order = self.emission.lock();
        self.sink.try_emit(&PipelineEvent::PipelineStarted {
            pipeline_id: self.id(),
            name: definition.name().to_string(),
            stage_count: definition.len(),
            timestamp: Utc::now(),
        });
    }

    /// Returns the pipeline id.
    #[must_use]
    pub fn id(&self) -> PipelineId {
        self.state.read().id()
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> PipelineStatus {
        self.state.read().status()
    }

    /// Returns true once the pipeline is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.read().is_terminal()
    }

    /// Returns a point-in-time copy of the state.
    #[must_use]
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.state.read().snapshot()
    }

    /// Returns the pipeline's cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels the pipeline.
    ///
    /// The transition is applied before this returns: the current stage and
    /// the pipeline are `Cancelled`, and the running unit of work is dropped
    /// at its next suspension point.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` if the pipeline is already terminal.
    pub fn cancel(&self, reason: impl Into<String>) -> Result<(), InvalidTransitionError> {
        let reason = reason.into();
        let _order = self.emission.lock();
        let events = {
            let mut state = self.state.write();
            let index = state.current_stage_index();
            let was_running = state
                .stages()
                .get(index)
                .is_some_and(|s| s.status == StageStatus::Running);

            state.cancel(reason.clone())?;

            let mut events = Vec::with_capacity(2);
            if was_running {
                if let Some(record) = state.stages().get(index) {
                    events.push(PipelineEvent::StageFinished {
                        pipeline_id: state.id(),
                        stage: record.name.clone(),
                        status: record.status,
                        result: None,
                        error: record.error.clone(),
                        duration_seconds: None,
                        timestamp: Utc::now(),
                    });
                }
            }
            events.push(finished_event(&state));
            info!(pipeline_id = %state.id(), reason = %reason, "Pipeline cancelled");
            events
        };
        self.emit_all(&events);
        self.token.cancel(reason);
        self.status.send_replace(PipelineStatus::Cancelled);
        Ok(())
    }

    /// Waits until the pipeline is terminal and returns its final state.
    pub async fn wait(&self) -> PipelineSnapshot {
        let mut rx = self.status.subscribe();
        if rx.wait_for(PipelineStatus::is_terminal).await.is_err() {
            debug!("Status channel closed while waiting");
        }
        self.snapshot()
    }

    fn emit_all(&self, events: &[PipelineEvent]) {
        for event in events {
            self.sink.try_emit(event);
        }
    }

    fn progress_reporter(self: &Arc<Self>, index: usize, stage: String) -> ProgressReporter {
        let handle = Arc::clone(self);
        ProgressReporter::new(move |progress| {
            let _order = handle.emission.lock();
            let reported = handle.state.write().report_progress(index, progress);
            match reported {
                Ok(Some(accepted)) => handle.sink.try_emit(&PipelineEvent::StageProgress {
                    pipeline_id: handle.id(),
                    stage: stage.clone(),
                    progress: accepted,
                    timestamp: Utc::now(),
                }),
                Ok(None) => {}
                Err(e) => debug!(stage = %stage, error = %e, "Progress report dropped"),
            }
        })
    }

    /// Starts the stage at `index`, returning the context for its work.
    ///
    /// Returns `None` if the pipeline reached a terminal state first.
    fn begin_stage(
        self: &Arc<Self>,
        index: usize,
        spec: &StageSpec,
        inputs: &Arc<PipelineInputs>,
    ) -> Option<StageContext> {
        let _order = self.emission.lock();
        let (id, results) = {
            let mut state = self.state.write();
            if let Err(e) = state.begin_current_stage() {
                debug!(stage = %spec.name, error = %e, "Stage not started");
                return None;
            }
            (state.id(), state.results())
        };
        self.sink.try_emit(&PipelineEvent::StageStarted {
            pipeline_id: id,
            stage: spec.name.clone(),
            index,
            timestamp: Utc::now(),
        });
        debug!(stage = %spec.name, index, "Stage started");

        Some(
            StageContext::new(id, spec.name.clone(), spec.kind)
                .with_index(index)
                .with_results(results)
                .with_inputs(Arc::clone(inputs))
                .with_progress(self.progress_reporter(index, spec.name.clone()))
                .with_cancellation(self.token.clone()),
        )
    }

    /// Applies a stage outcome. Returns true when the pipeline is terminal.
    fn finish_stage(
        &self,
        spec: &StageSpec,
        outcome: Result<StageResult, StageFailure>,
        duration_seconds: f64,
    ) -> bool {
        let _order = self.emission.lock();
        let mut state = self.state.write();
        if state.is_terminal() {
            debug!(stage = %spec.name, "Outcome discarded, pipeline already terminal");
            return true;
        }

        let applied = match outcome {
            Ok(result) => state
                .complete_current_stage(result.clone(), duration_seconds)
                .map(|()| {
                    info!(stage = %spec.name, duration_seconds, "Stage completed");
                    PipelineEvent::StageFinished {
                        pipeline_id: state.id(),
                        stage: spec.name.clone(),
                        status: StageStatus::Completed,
                        result: Some(result),
                        error: None,
                        duration_seconds: Some(duration_seconds),
                        timestamp: Utc::now(),
                    }
                }),
            Err(failure) => {
                let error = failure.to_string();
                state.fail_current_stage(error.clone()).map(|()| {
                    warn!(stage = %spec.name, error = %error, "Stage failed");
                    PipelineEvent::StageFinished {
                        pipeline_id: state.id(),
                        stage: spec.name.clone(),
                        status: StageStatus::Failed,
                        result: None,
                        error: Some(error),
                        duration_seconds: None,
                        timestamp: Utc::now(),
                    }
                })
            }
        };

        let stage_finished = match applied {
            Ok(event) => event,
            Err(e) => {
                warn!(stage = %spec.name, error = %e, "Stage outcome rejected");
                return state.is_terminal();
            }
        };

        if !state.is_terminal() {
            drop(state);
            self.sink.try_emit(&stage_finished);
            return false;
        }
        let pipeline_finished = finished_event(&state);
        let status = state.status();
        drop(state);
        info!(status = %status, "Pipeline finished");
        self.emit_all(&[stage_finished, pipeline_finished]);
        self.status.send_replace(status);
        true
    }
}

fn finished_event(state: &PipelineState) -> PipelineEvent {
    PipelineEvent::PipelineFinished {
        pipeline_id: state.id(),
        status: state.status(),
        counters: state.counters(),
        error: state.error().map(ToString::to_string),
        timestamp: Utc::now(),
    }
}

fn check_kind(spec: &StageSpec, result: StageResult) -> Result<StageResult, StageFailure> {
    if result.kind() == spec.kind {
        Ok(result)
    } else {
        Err(StageFailure::new(
            spec.name.clone(),
            CollaboratorError::ResultKindMismatch {
                expected: spec.kind,
                actual: result.kind(),
            },
        ))
    }
}

/// Runs every stage of `definition` in order against `handle`.
///
/// Returns when the pipeline is terminal. A cancelled pipeline's running
/// stage future is dropped without its outcome being applied. A stage that
/// panics fails the pipeline.
pub async fn run_pipeline(
    handle: Arc<PipelineHandle>,
    definition: PipelineDefinition,
    inputs: Arc<PipelineInputs>,
) -> PipelineStatus {
    let span = pipeline_span(handle.id(), definition.name(), definition.len());

    async move {
        info!("Pipeline started");
        for (index, spec) in definition.stages().iter().enumerate() {
            let Some(ctx) = handle.begin_stage(index, spec, &inputs) else {
                break;
            };

            let timer = SpanTimer::start(spec.name.clone());
            let work = AssertUnwindSafe(
                spec.runner
                    .run(&ctx)
                    .instrument(stage_span(&spec.name, spec.kind, index)),
            )
            .catch_unwind();
            let outcome = tokio::select! {
                biased;
                () = handle.token.cancelled() => None,
                caught = work => Some(caught.unwrap_or_else(|payload| {
                    error!(stage = %spec.name, "Stage panicked");
                    Err(StageFailure::new(
                        spec.name.clone(),
                        CollaboratorError::panicked(payload.as_ref()),
                    ))
                })),
            };

            let Some(outcome) = outcome else {
                debug!(stage = %spec.name, "Stage dropped on cancellation");
                break;
            };

            let duration = timer.finish();
            if handle.finish_stage(spec, outcome.and_then(|r| check_kind(spec, r)), duration) {
                break;
            }
        }
        handle.status()
    }
    .instrument(span)
    .await
}
