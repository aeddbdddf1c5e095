//! Stage kind and lifecycle status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of work a stage performs in the lead-generation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Collects raw leads from scrape targets.
    Scrape,
    /// Narrows the lead set with a predicate set.
    Filter,
    /// Scores and prioritises leads.
    Qualify,
    /// Pushes qualified leads to CRM destinations.
    Sync,
    /// Checks synced records for duplicates and gaps.
    Quality,
    /// Summarises every prior result.
    Report,
}

impl StageKind {
    /// All kinds in canonical pipeline order.
    pub const ALL: [Self; 6] = [
        Self::Scrape,
        Self::Filter,
        Self::Qualify,
        Self::Sync,
        Self::Quality,
        Self::Report,
    ];

    /// The kind whose result this kind consumes, if any.
    #[must_use]
    pub fn consumes(self) -> Option<Self> {
        match self {
            Self::Scrape => None,
            Self::Filter => Some(Self::Scrape),
            Self::Qualify => Some(Self::Filter),
            Self::Sync => Some(Self::Qualify),
            Self::Quality => Some(Self::Sync),
            Self::Report => Some(Self::Quality),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scrape => write!(f, "scrape"),
            Self::Filter => write!(f, "filter"),
            Self::Qualify => write!(f, "qualify"),
            Self::Sync => write!(f, "sync"),
            Self::Quality => write!(f, "quality"),
            Self::Report => write!(f, "report"),
        }
    }
}

/// The lifecycle status of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Waiting for its turn.
    #[default]
    Pending,
    /// Currently executing.
    Running,
    /// Finished with a result.
    Completed,
    /// Finished with an error.
    Failed,
    /// Stopped by pipeline cancellation.
    Cancelled,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// The status of a whole pipeline run.
///
/// There is no pending state: a pipeline runs from construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Stages are still executing.
    #[default]
    Running,
    /// Every stage completed.
    Completed,
    /// A stage failed; later stages never ran.
    Failed,
    /// The run was cancelled.
    Cancelled,
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl PipelineStatus {
    /// Returns true once no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}
