//! Stage lifecycle record.

use crate::core::{StageKind, StageResult, StageStatus};
use crate::errors::InvalidTransitionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The lifecycle state of one stage within one pipeline.
///
/// `Pending -> Running -> Completed | Failed`, or `Cancelled` from either
/// non-terminal state. A terminal record never changes again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Stage name.
    pub name: String,
    /// Stage kind.
    pub kind: StageKind,
    /// Current status.
    pub status: StageStatus,
    /// Progress in `[0, 1]`.
    pub progress: f64,
    /// Result, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<StageResult>,
    /// Error, once failed or cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    /// When the stage started running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the stage reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl StageRecord {
    /// Creates a pending record.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: StageKind) -> Self {
        Self {
            name: name.into(),
            kind,
            status: StageStatus::Pending,
            progress: 0.0,
            result: None,
            error: None,
            duration_seconds: None,
            started_at: None,
            finished_at: None,
        }
    }

    fn invalid(&self, action: &str) -> InvalidTransitionError {
        InvalidTransitionError::new(format!("stage '{}'", self.name), action, self.status)
    }

    /// Moves a pending stage to running.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` unless the stage is pending.
    pub fn start(&mut self) -> Result<(), InvalidTransitionError> {
        if self.status != StageStatus::Pending {
            return Err(self.invalid("start"));
        }
        self.status = StageStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Records progress, clamped to `[0, 1]`.
    ///
    /// Returns the new progress if it advanced, `None` if the report was at
    /// or below the current value (or not a number).
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` unless the stage is running.
    pub fn report_progress(&mut self, progress: f64) -> Result<Option<f64>, InvalidTransitionError> {
        if self.status != StageStatus::Running {
            return Err(self.invalid("report progress for"));
        }
        if progress.is_nan() {
            return Ok(None);
        }
        let progress = progress.clamp(0.0, 1.0);
        if progress <= self.progress {
            return Ok(None);
        }
        self.progress = progress;
        Ok(Some(progress))
    }

    /// Completes a running stage with its result.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` unless the stage is running; the
    /// record is left unchanged.
    pub fn complete(
        &mut self,
        result: StageResult,
        duration_seconds: f64,
    ) -> Result<(), InvalidTransitionError> {
        if self.status != StageStatus::Running {
            return Err(self.invalid("complete"));
        }
        self.status = StageStatus::Completed;
        self.progress = 1.0;
        self.result = Some(result);
        self.duration_seconds = Some(duration_seconds);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Fails a running stage.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` unless the stage is running.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), InvalidTransitionError> {
        if self.status != StageStatus::Running {
            return Err(self.invalid("fail"));
        }
        self.status = StageStatus::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Cancels a pending or running stage.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransitionError` if the stage is already terminal.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransitionError> {
        if self.status.is_terminal() {
            return Err(self.invalid("cancel"));
        }
        self.status = StageStatus::Cancelled;
        self.error = Some(reason.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Returns true once the record is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScrapeResult;
    use pretty_assertions::assert_eq;

    fn scrape(total: u64) -> StageResult {
        StageResult::Scrape(ScrapeResult {
            total_leads: total,
            sources: Vec::new(),
        })
    }

    fn running() -> StageRecord {
        let mut record = StageRecord::new("scrape", StageKind::Scrape);
        record.start().unwrap();
        record
    }

    #[test]
    fn test_happy_path() {
        let mut record = StageRecord::new("scrape", StageKind::Scrape);
        assert_eq!(record.status, StageStatus::Pending);

        record.start().unwrap();
        assert_eq!(record.status, StageStatus::Running);
        assert!(record.started_at.is_some());

        record.complete(scrape(2847), 15.0).unwrap();
        assert_eq!(record.status, StageStatus::Completed);
        assert!((record.progress - 1.0).abs() < f64::EPSILON);
        assert_eq!(record.duration_seconds, Some(15.0));
        assert!(record.is_terminal());
    }

    #[test]
    fn test_complete_twice_keeps_first_result() {
        let mut record = running();
        record.complete(scrape(1), 1.0).unwrap();

        let err = record.complete(scrape(2), 2.0).unwrap_err();
        assert_eq!(err.action, "complete");
        assert_eq!(record.result, Some(scrape(1)));
        assert_eq!(record.duration_seconds, Some(1.0));
    }

    #[test]
    fn test_complete_while_pending_is_invalid() {
        let mut record = StageRecord::new("scrape", StageKind::Scrape);
        let err = record.complete(scrape(1), 1.0).unwrap_err();
        assert_eq!(err.state, "pending");
        assert_eq!(record.status, StageStatus::Pending);
        assert!(record.result.is_none());
    }

    #[test]
    fn test_start_after_terminal_is_invalid() {
        let mut record = running();
        record.fail("boom").unwrap();
        assert!(record.start().is_err());

        let mut record = running();
        record.complete(scrape(1), 1.0).unwrap();
        assert!(record.start().is_err());
        assert!(record.fail("late").is_err());
    }

    #[test]
    fn test_progress_clamps_and_never_decreases() {
        let mut record = running();

        assert_eq!(record.report_progress(0.4).unwrap(), Some(0.4));
        assert_eq!(record.report_progress(0.2).unwrap(), None);
        assert!((record.progress - 0.4).abs() < f64::EPSILON);
        assert_eq!(record.report_progress(7.0).unwrap(), Some(1.0));
        assert_eq!(record.report_progress(f64::NAN).unwrap(), None);
    }

    #[test]
    fn test_progress_requires_running() {
        let mut record = StageRecord::new("scrape", StageKind::Scrape);
        assert!(record.report_progress(0.5).is_err());

        record.start().unwrap();
        record.complete(scrape(1), 1.0).unwrap();
        assert!(record.report_progress(0.5).is_err());
    }

    #[test]
    fn test_cancel() {
        let mut pending = StageRecord::new("filter", StageKind::Filter);
        pending.cancel("user").unwrap();
        assert_eq!(pending.status, StageStatus::Cancelled);
        assert_eq!(pending.error.as_deref(), Some("user"));
        assert!(pending.cancel("again").is_err());

        let mut record = running();
        record.complete(scrape(1), 1.0).unwrap();
        assert!(record.cancel("late").is_err());
    }

    #[test]
    fn test_failure_records_error() {
        let mut record = running();
        record.fail("Target unreachable").unwrap();
        assert_eq!(record.status, StageStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("Target unreachable"));
        assert!(record.duration_seconds.is_none());
    }
}
