//! Pipeline state machine.

use super::{PipelineDefinition, StageRecord};
use crate::context::ResultStore;
use crate::core::{PipelineId, PipelineStatus, RolledUpCounters, StageResult, StageStatus};
use crate::errors::InvalidTransitionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The mutable state of one pipeline run.
///
/// Stages advance strictly in order: stage *k* is running or terminal only
/// if every stage before it completed, and `current_stage_index` never
/// decreases.
#[derive(Debug, Clone)]
pub struct PipelineState {
    id: PipelineId,
    name: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    status: PipelineStatus,
    current_stage_index: usize,
    stages: Vec<StageRecord>,
    error: Option<String>,
}

impl PipelineState {
    /// Creates a running pipeline with fresh pending records.
    #[must_use]
    pub fn new(id: PipelineId, definition: &PipelineDefinition) -> Self {
        Self {
            id,
            name: definition.name().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            status: PipelineStatus::Running,
            current_stage_index: 0,
            stages: definition
                .stages()
                .iter()
                .map(|spec| StageRecord::new(spec.name.clone(), spec.kind))
                .collect(),
            error: None,
        }
    }

    fn invalid(&self, action: &str) -> InvalidTransitionError {
        InvalidTransitionError::new(format!("pipeline '{}'", self.id), action, self.status)
    }

    fn ensure_running(&self, action: &str) -> Result<(), InvalidTransitionError> {
        if self.status.is_terminal() {
            Err(self.invalid(action))
        } else {
            Ok(())
        }
    }

    fn current_mut(&mut self, action: &str) -> Result<&mut StageRecord, InvalidTransitionError> {
        let index = self.current_stage_index;
        if index >= self.stages.len() {
            return Err(self.invalid(action));
        }
        Ok(&mut self.stages[index])
    }

    fn finish(&mut self, status: PipelineStatus, error: Option<String>) {
        self.status = status;
        self.error = error;
        self.finished_at = Some(Utc::now());
    }

    /// Starts the stage at the current index.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` if the pipeline is terminal or the
    /// current stage is not pending.
    pub fn begin_current_stage(&mut self) -> Result<&StageRecord, InvalidTransitionError> {
        self.ensure_running("start a stage of")?;
        let record = self.current_mut("start a stage of")?;
        record.start()?;
        Ok(record)
    }

    /// Applies a progress report from the stage at `index`.
    ///
    /// Returns the accepted progress, or `None` if the report did not advance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` if the pipeline is terminal, `index`
    /// is not the current stage, or that stage is not running.
    pub fn report_progress(
        &mut self,
        index: usize,
        progress: f64,
    ) -> Result<Option<f64>, InvalidTransitionError> {
        self.ensure_running("report progress for")?;
        if index != self.current_stage_index {
            return Err(InvalidTransitionError::new(
                format!("stage #{index}"),
                "report progress for",
                "not current",
            ));
        }
        self.current_mut("report progress for")?.report_progress(progress)
    }

    /// Completes the current stage and advances.
    ///
    /// The pipeline completes when the last stage does.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` if the pipeline is terminal or the
    /// current stage is not running.
    pub fn complete_current_stage(
        &mut self,
        result: StageResult,
        duration_seconds: f64,
    ) -> Result<(), InvalidTransitionError> {
        self.ensure_running("complete a stage of")?;
        self.current_mut("complete a stage of")?
            .complete(result, duration_seconds)?;
        self.current_stage_index += 1;
        if self.current_stage_index == self.stages.len() {
            self.finish(PipelineStatus::Completed, None);
        }
        Ok(())
    }

    /// Fails the current stage and the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` if the pipeline is terminal or the
    /// current stage is not running.
    pub fn fail_current_stage(&mut self, error: impl Into<String>) -> Result<(), InvalidTransitionError> {
        self.ensure_running("fail a stage of")?;
        let error = error.into();
        self.current_mut("fail a stage of")?.fail(error.clone())?;
        self.finish(PipelineStatus::Failed, Some(error));
        Ok(())
    }

    /// Cancels the pipeline and its current stage.
    ///
    /// Later stages stay pending and never run.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` if the pipeline is already terminal.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransitionError> {
        self.ensure_running("cancel")?;
        let reason = reason.into();
        if let Some(record) = self.stages.get_mut(self.current_stage_index) {
            if !record.is_terminal() {
                record.cancel(reason.clone())?;
            }
        }
        self.finish(PipelineStatus::Cancelled, Some(reason));
        Ok(())
    }

    /// Returns the pipeline id.
    #[must_use]
    pub fn id(&self) -> PipelineId {
        self.id
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pipeline status.
    #[must_use]
    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    /// Returns true once the pipeline is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns the index of the running or next pending stage.
    #[must_use]
    pub fn current_stage_index(&self) -> usize {
        self.current_stage_index
    }

    /// Returns the stage records in definition order.
    #[must_use]
    pub fn stages(&self) -> &[StageRecord] {
        &self.stages
    }

    /// Returns a stage record by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns the results of completed stages, in order.
    #[must_use]
    pub fn results(&self) -> ResultStore {
        self.stages
            .iter()
            .filter_map(|s| s.result.clone().map(|r| (s.name.clone(), r)))
            .collect()
    }

    /// Projects the rolled-up counters from completed results.
    #[must_use]
    pub fn counters(&self) -> RolledUpCounters {
        RolledUpCounters::project(
            self.stages
                .iter()
                .filter(|s| s.status == StageStatus::Completed)
                .filter_map(|s| s.result.as_ref()),
        )
    }

    /// Returns the mean progress across stages.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn overall_progress(&self) -> f64 {
        if self.stages.is_empty() {
            return 0.0;
        }
        self.stages.iter().map(|s| s.progress).sum::<f64>() / self.stages.len() as f64
    }

    /// Returns the failure or cancellation annotation.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns a serialisable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            started_at: self.started_at,
            finished_at: self.finished_at,
            current_stage_index: self.current_stage_index,
            stages: self.stages.clone(),
            counters: self.counters(),
            overall_progress: self.overall_progress(),
            error: self.error.clone(),
        }
    }
}

/// A point-in-time copy of a pipeline's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Pipeline id.
    pub id: PipelineId,
    /// Pipeline name.
    pub name: String,
    /// Pipeline status.
    pub status: PipelineStatus,
    /// When the pipeline was created.
    pub started_at: DateTime<Utc>,
    /// When the pipeline reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Index of the running or next pending stage.
    pub current_stage_index: usize,
    /// Stage records in definition order.
    pub stages: Vec<StageRecord>,
    /// Rolled-up counters.
    pub counters: RolledUpCounters,
    /// Mean stage progress in `[0, 1]`.
    pub overall_progress: f64,
    /// Failure or cancellation annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineSnapshot {
    /// Returns a stage record by name.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Returns true once the pipeline is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::reference_result;
    use crate::core::StageKind;
    use crate::testing::reference_definition;
    use pretty_assertions::assert_eq;

    fn state() -> PipelineState {
        PipelineState::new(PipelineId::new(), &reference_definition(3))
    }

    #[test]
    fn test_new_state_is_running_with_pending_stages() {
        let state = state();
        assert_eq!(state.status(), PipelineStatus::Running);
        assert_eq!(state.current_stage_index(), 0);
        assert!(state.stages().iter().all(|s| s.status == StageStatus::Pending));
        assert_eq!(state.counters(), RolledUpCounters::default());
    }

    #[test]
    fn test_counters_project_after_scrape() {
        let mut state = state();
        assert_eq!(state.counters().total_leads, 0);

        state.begin_current_stage().unwrap();
        assert_eq!(state.counters().total_leads, 0);
        state
            .complete_current_stage(reference_result(StageKind::Scrape), 15.0)
            .unwrap();

        assert_eq!(state.counters().total_leads, 2847);
        assert_eq!(state.current_stage_index(), 1);
        assert_eq!(state.results().len(), 1);
    }

    #[test]
    fn test_completes_after_last_stage() {
        let mut state = state();
        for kind in [StageKind::Scrape, StageKind::Filter, StageKind::Qualify] {
            state.begin_current_stage().unwrap();
            state.complete_current_stage(reference_result(kind), 1.0).unwrap();
        }

        assert_eq!(state.status(), PipelineStatus::Completed);
        assert!((state.overall_progress() - 1.0).abs() < f64::EPSILON);
        assert!(state.begin_current_stage().is_err());

        let snapshot = state.snapshot();
        assert!(snapshot.finished_at.is_some());
        assert_eq!(snapshot.counters.qualified_leads, 342);
    }

    #[test]
    fn test_failure_stops_pipeline() {
        let mut state = state();
        state.begin_current_stage().unwrap();
        state
            .complete_current_stage(reference_result(StageKind::Scrape), 1.0)
            .unwrap();
        state.begin_current_stage().unwrap();
        state.fail_current_stage("Rejected: bad filter").unwrap();

        assert_eq!(state.status(), PipelineStatus::Failed);
        assert_eq!(state.error(), Some("Rejected: bad filter"));
        assert_eq!(state.stages()[2].status, StageStatus::Pending);
        assert!(state.begin_current_stage().is_err());
    }

    #[test]
    fn test_progress_only_for_current_running_stage() {
        let mut state = state();
        assert!(state.report_progress(0, 0.5).is_err());

        state.begin_current_stage().unwrap();
        assert_eq!(state.report_progress(0, 0.5).unwrap(), Some(0.5));
        assert!(state.report_progress(1, 0.5).is_err());

        state
            .complete_current_stage(reference_result(StageKind::Scrape), 1.0)
            .unwrap();
        assert!(state.report_progress(0, 0.9).is_err());
    }

    #[test]
    fn test_cancel_running_pipeline() {
        let mut state = state();
        state.begin_current_stage().unwrap();
        state.cancel("user requested").unwrap();

        assert_eq!(state.status(), PipelineStatus::Cancelled);
        assert_eq!(state.stages()[0].status, StageStatus::Cancelled);
        assert_eq!(state.stages()[1].status, StageStatus::Pending);
        assert!(state.report_progress(0, 0.9).is_err());
        assert!(state
            .complete_current_stage(reference_result(StageKind::Scrape), 1.0)
            .is_err());
    }

    #[test]
    fn test_cancel_terminal_is_invalid() {
        let mut state = state();
        state.cancel("first").unwrap();
        let err = state.cancel("second").unwrap_err();
        assert_eq!(err.state, "cancelled");
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(state().snapshot()).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["stages"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["counters"]["total_leads"], 0);
    }
}
