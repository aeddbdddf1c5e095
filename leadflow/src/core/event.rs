//! Pipeline events delivered to observers.

use super::{PipelineId, PipelineStatus, RolledUpCounters, StageResult, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event emitted while a pipeline executes.
///
/// Progress ticks for a stage are only emitted while that stage is running;
/// its `StageFinished` event is always the last event carrying its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A pipeline was registered and began executing.
    PipelineStarted {
        /// The pipeline.
        pipeline_id: PipelineId,
        /// Display name of the run.
        name: String,
        /// Number of stages in the run.
        stage_count: usize,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
    },

    /// A stage transitioned to running.
    StageStarted {
        /// The pipeline.
        pipeline_id: PipelineId,
        /// The stage name.
        stage: String,
        /// Position of the stage in the pipeline.
        index: usize,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
    },

    /// A running stage reported progress.
    StageProgress {
        /// The pipeline.
        pipeline_id: PipelineId,
        /// The stage name.
        stage: String,
        /// Progress in `[0, 1]`.
        progress: f64,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
    },

    /// A stage reached a terminal status.
    StageFinished {
        /// The pipeline.
        pipeline_id: PipelineId,
        /// The stage name.
        stage: String,
        /// The terminal status.
        status: StageStatus,
        /// The result, for completed stages.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<StageResult>,
        /// The error, for failed or cancelled stages.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Wall-clock duration, for completed stages.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_seconds: Option<f64>,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
    },

    /// The pipeline reached a terminal status.
    PipelineFinished {
        /// The pipeline.
        pipeline_id: PipelineId,
        /// The terminal status.
        status: PipelineStatus,
        /// Final rolled-up counters.
        counters: RolledUpCounters,
        /// Error annotation for failed or cancelled runs.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// When the event occurred.
        timestamp: DateTime<Utc>,
    },
}

impl PipelineEvent {
    /// Returns a dotted event type name (e.g. "stage.progress").
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PipelineStarted { .. } => "pipeline.started",
            Self::StageStarted { .. } => "stage.started",
            Self::StageProgress { .. } => "stage.progress",
            Self::StageFinished { .. } => "stage.finished",
            Self::PipelineFinished { .. } => "pipeline.finished",
        }
    }

    /// Returns the pipeline the event belongs to.
    #[must_use]
    pub fn pipeline_id(&self) -> PipelineId {
        match self {
            Self::PipelineStarted { pipeline_id, .. }
            | Self::StageStarted { pipeline_id, .. }
            | Self::StageProgress { pipeline_id, .. }
            | Self::StageFinished { pipeline_id, .. }
            | Self::PipelineFinished { pipeline_id, .. } => *pipeline_id,
        }
    }

    /// Returns the stage name for stage-level events.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StageStarted { stage, .. }
            | Self::StageProgress { stage, .. }
            | Self::StageFinished { stage, .. } => Some(stage),
            Self::PipelineStarted { .. } | Self::PipelineFinished { .. } => None,
        }
    }

    /// Returns true for events after which nothing more is emitted for their subject.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StageFinished { .. } | Self::PipelineFinished { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_event(id: PipelineId) -> PipelineEvent {
        PipelineEvent::StageProgress {
            pipeline_id: id,
            stage: "scrape".to_string(),
            progress: 0.25,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_event_type_names() {
        let id = PipelineId::new();
        assert_eq!(progress_event(id).event_type(), "stage.progress");

        let finished = PipelineEvent::PipelineFinished {
            pipeline_id: id,
            status: PipelineStatus::Completed,
            counters: RolledUpCounters::default(),
            error: None,
            timestamp: Utc::now(),
        };
        assert_eq!(finished.event_type(), "pipeline.finished");
        assert!(finished.is_terminal());
        assert!(finished.stage().is_none());
    }

    #[test]
    fn test_event_accessors() {
        let id = PipelineId::new();
        let event = progress_event(id);
        assert_eq!(event.pipeline_id(), id);
        assert_eq!(event.stage(), Some("scrape"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_event_serialization_tag() {
        let json = serde_json::to_value(progress_event(PipelineId::new())).unwrap();
        assert_eq!(json["type"], "stage_progress");
        assert_eq!(json["progress"], 0.25);
    }

    #[test]
    fn test_finished_event_omits_empty_fields() {
        let event = PipelineEvent::StageFinished {
            pipeline_id: PipelineId::new(),
            stage: "filter".to_string(),
            status: StageStatus::Failed,
            result: None,
            error: Some("boom".to_string()),
            duration_seconds: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"], "boom");
    }
}
