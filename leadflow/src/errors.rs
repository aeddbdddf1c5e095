//! Error types for the leadflow orchestrator.
//!
//! Structural failures (`InvalidTransition`, `StageFailure`, `NotFound`,
//! `Validation`) are errors. Business-level partial failures such as failed
//! CRM syncs or duplicate records are reported as counts inside stage
//! results and never surface here.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::core::StageKind;

/// The main error type for leadflow operations.
#[derive(Debug, Error)]
pub enum LeadflowError {
    /// A pipeline definition failed validation.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// A stage or pipeline method was called from a state that forbids it.
    #[error("{0}")]
    InvalidTransition(#[from] InvalidTransitionError),

    /// A stage's unit of work rejected.
    #[error("{0}")]
    StageFailure(#[from] StageFailure),

    /// An orchestrator lookup used an unknown pipeline id.
    #[error("{0}")]
    NotFound(#[from] PipelineNotFoundError),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LeadflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Metadata about a definition error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "DEFINITION-WIRING").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Error raised when a pipeline definition is rejected.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }

    /// Returns the error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.error_info.as_ref().map(|info| info.code.as_str())
    }
}

/// Error raised when a lifecycle method is invoked from the wrong state.
///
/// This is a programmer error: fatal to the call, never to the process.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid transition: cannot {action} {subject} while it is {state}")]
pub struct InvalidTransitionError {
    /// What the transition was attempted on (e.g. "stage 'scrape'").
    pub subject: String,
    /// The attempted action (e.g. "complete").
    pub action: String,
    /// The state the subject was in.
    pub state: String,
}

impl InvalidTransitionError {
    /// Creates a new invalid transition error.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        state: impl std::fmt::Display,
    ) -> Self {
        Self {
            subject: subject.into(),
            action: action.into(),
            state: state.to_string(),
        }
    }
}

/// Error raised when an orchestrator lookup misses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Pipeline not found: {id}")]
pub struct PipelineNotFoundError {
    /// The unknown pipeline id.
    pub id: String,
}

impl PipelineNotFoundError {
    /// Creates a new not-found error.
    #[must_use]
    pub fn new(id: impl std::fmt::Display) -> Self {
        Self { id: id.to_string() }
    }
}

/// Why a collaborator rejected a stage's unit of work.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CollaboratorError {
    /// The scrape target could not be reached.
    #[error("Target unreachable: {target}")]
    Unreachable {
        /// The unreachable target.
        target: String,
    },

    /// The scrape target refused access.
    #[error("Blocked by {target}: {reason}")]
    Blocked {
        /// The blocking target.
        target: String,
        /// Why access was refused.
        reason: String,
    },

    /// The scrape produced no records.
    #[error("No data found")]
    NoDataFound,

    /// A required input from a prior stage or the pipeline inputs is absent.
    #[error("Missing input: {what}")]
    MissingInput {
        /// Description of the missing input.
        what: String,
    },

    /// The collaborator refused the request outright.
    #[error("Rejected: {reason}")]
    Rejected {
        /// The reason for refusal.
        reason: String,
    },

    /// The stage produced a result for a different stage kind.
    #[error("Result kind mismatch: expected {expected}, got {actual}")]
    ResultKindMismatch {
        /// The kind the stage declares.
        expected: StageKind,
        /// The kind of the result it produced.
        actual: StageKind,
    },

    /// The stage's unit of work panicked.
    #[error("Stage panicked: {message}")]
    Panicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl CollaboratorError {
    /// Creates an unreachable error.
    #[must_use]
    pub fn unreachable(target: impl Into<String>) -> Self {
        Self::Unreachable {
            target: target.into(),
        }
    }

    /// Creates a blocked error.
    #[must_use]
    pub fn blocked(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Blocked {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing input error.
    #[must_use]
    pub fn missing_input(what: impl Into<String>) -> Self {
        Self::MissingInput { what: what.into() }
    }

    /// Creates a rejected error.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Creates a panicked error from a panic payload.
    #[must_use]
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked { message }
    }
}

/// Error raised when a stage's unit of work fails.
///
/// Fails the owning pipeline and halts every later stage of it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Stage '{stage}' failed: {cause}")]
pub struct StageFailure {
    /// The failing stage.
    pub stage: String,
    /// The underlying cause.
    #[source]
    pub cause: CollaboratorError,
}

impl StageFailure {
    /// Creates a new stage failure.
    #[must_use]
    pub fn new(stage: impl Into<String>, cause: CollaboratorError) -> Self {
        Self {
            stage: stage.into(),
            cause,
        }
    }
}

/// Convenience result alias.
pub type Result<T, E = LeadflowError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error_info_creation() {
        let info = ContractErrorInfo::new("DEFINITION-WIRING", "Missing upstream stage")
            .with_fix_hint("Add a filter stage first")
            .with_context_entry("stage", "qualify");

        assert_eq!(info.code, "DEFINITION-WIRING");
        assert_eq!(info.fix_hint, Some("Add a filter stage first".to_string()));
        assert_eq!(info.context.get("stage"), Some(&"qualify".to_string()));
    }

    #[test]
    fn test_validation_error_code() {
        let err = PipelineValidationError::new("empty")
            .with_error_info(ContractErrorInfo::new("DEFINITION-EMPTY", "no stages"));
        assert_eq!(err.code(), Some("DEFINITION-EMPTY"));
        assert!(PipelineValidationError::new("plain").code().is_none());
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = InvalidTransitionError::new("stage 'scrape'", "complete", "pending");
        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot complete stage 'scrape' while it is pending"
        );
    }

    #[test]
    fn test_stage_failure_display_includes_cause() {
        let err = StageFailure::new("scrape", CollaboratorError::unreachable("https://example.com"));
        let text = err.to_string();
        assert!(text.contains("scrape"));
        assert!(text.contains("https://example.com"));
    }

    #[test]
    fn test_collaborator_error_serialization() {
        let err = CollaboratorError::blocked("linkedin.com", "rate limited");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "blocked");
        assert_eq!(json["target"], "linkedin.com");
    }

    #[test]
    fn test_leadflow_error_conversions() {
        let err: LeadflowError = PipelineNotFoundError::new("abc").into();
        assert!(matches!(err, LeadflowError::NotFound(_)));

        let err: LeadflowError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, LeadflowError::Serialization(_)));
    }

    #[test]
    fn test_panicked_reads_string_payloads() {
        let from_str: Box<dyn std::any::Any + Send> = Box::new("boom");
        let from_string: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        let opaque: Box<dyn std::any::Any + Send> = Box::new(7_u32);

        assert_eq!(CollaboratorError::panicked(from_str.as_ref()).to_string(), "Stage panicked: boom");
        assert_eq!(CollaboratorError::panicked(from_string.as_ref()).to_string(), "Stage panicked: bang");
        assert!(matches!(
            CollaboratorError::panicked(opaque.as_ref()),
            CollaboratorError::Panicked { .. }
        ));
    }
}
