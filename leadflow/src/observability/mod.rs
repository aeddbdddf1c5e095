//! Observability utilities.
//!
//! Installs the `tracing` subscriber and provides the span helpers the
//! pipeline runner wraps its work in.

mod spans;

pub use spans::{pipeline_span, stage_span, SpanTimer};

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::{LeadflowError, Result};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Builds the event filter: `RUST_LOG` when set and valid, the configured
/// directive otherwise.
///
/// # Errors
///
/// Returns `LeadflowError::Config` if the configured directive is invalid.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| LeadflowError::Config(format!("invalid log filter '{}': {e}", config.filter)))
}

/// Installs a global fmt subscriber for the given logging configuration.
///
/// # Errors
///
/// Returns `LeadflowError::Config` if the filter is invalid or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_span_events(span_events)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(span_events)
            .try_init(),
    };

    installed.map_err(|e| LeadflowError::Config(format!("failed to install subscriber: {e}")))
}
