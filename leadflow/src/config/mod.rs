//! Crate configuration.
//!
//! `LeadflowConfig` groups the orchestrator, simulation, qualification and
//! logging settings. It loads from JSON (file or string); every field has a
//! default, and `LEADFLOW_*` environment variables override the loaded values.

#[cfg(test)]
mod config_tests;

use crate::core::StageKind;
use crate::errors::{LeadflowError, Result};
use crate::qualification::QualificationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-receiver buffer of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_channel_capacity: usize,
    /// Terminal pipelines retained before the oldest are evicted; unbounded when unset.
    #[serde(default)]
    pub max_retained_pipelines: Option<usize>,
    /// Whether pipeline events are also written to the tracing log.
    #[serde(default = "default_log_events")]
    pub log_events: bool,
}

fn default_event_capacity() -> usize {
    1024
}

fn default_log_events() -> bool {
    true
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: default_event_capacity(),
            max_retained_pipelines: None,
            log_events: default_log_events(),
        }
    }
}

impl OrchestratorConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Caps the number of retained terminal pipelines.
    #[must_use]
    pub fn with_max_retained_pipelines(mut self, max: usize) -> Self {
        self.max_retained_pipelines = Some(max);
        self
    }

    /// Enables or disables event logging.
    #[must_use]
    pub fn with_log_events(mut self, enabled: bool) -> Self {
        self.log_events = enabled;
        self
    }
}

/// Simulated stage durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDurations {
    /// Scrape duration.
    #[serde(default = "default_scrape_ms")]
    pub scrape_ms: u64,
    /// Filter duration.
    #[serde(default = "default_filter_ms")]
    pub filter_ms: u64,
    /// Qualify duration.
    #[serde(default = "default_qualify_ms")]
    pub qualify_ms: u64,
    /// Sync duration.
    #[serde(default = "default_sync_ms")]
    pub sync_ms: u64,
    /// Quality duration.
    #[serde(default = "default_quality_ms")]
    pub quality_ms: u64,
    /// Report duration.
    #[serde(default = "default_report_ms")]
    pub report_ms: u64,
}

fn default_scrape_ms() -> u64 {
    15_000
}

fn default_filter_ms() -> u64 {
    8_000
}

fn default_qualify_ms() -> u64 {
    12_000
}

fn default_sync_ms() -> u64 {
    6_000
}

fn default_quality_ms() -> u64 {
    5_000
}

fn default_report_ms() -> u64 {
    3_000
}

impl Default for StageDurations {
    fn default() -> Self {
        Self {
            scrape_ms: default_scrape_ms(),
            filter_ms: default_filter_ms(),
            qualify_ms: default_qualify_ms(),
            sync_ms: default_sync_ms(),
            quality_ms: default_quality_ms(),
            report_ms: default_report_ms(),
        }
    }
}

impl StageDurations {
    /// Sets every duration to the same value.
    #[must_use]
    pub fn uniform(ms: u64) -> Self {
        Self {
            scrape_ms: ms,
            filter_ms: ms,
            qualify_ms: ms,
            sync_ms: ms,
            quality_ms: ms,
            report_ms: ms,
        }
    }

    /// Returns the configured duration for a kind, in milliseconds.
    #[must_use]
    pub fn millis_for(&self, kind: StageKind) -> u64 {
        match kind {
            StageKind::Scrape => self.scrape_ms,
            StageKind::Filter => self.filter_ms,
            StageKind::Qualify => self.qualify_ms,
            StageKind::Sync => self.sync_ms,
            StageKind::Quality => self.quality_ms,
            StageKind::Report => self.report_ms,
        }
    }
}

/// Settings for the simulated collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Interval between progress ticks in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound of the random progress increment per tick, in `(0, 1]`.
    #[serde(default = "default_max_increment")]
    pub max_progress_increment: f64,
    /// Stage durations.
    #[serde(default)]
    pub durations: StageDurations,
    /// Multiplier applied to every duration and tick (e.g. 0.01 in tests).
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

fn default_tick_ms() -> u64 {
    500
}

fn default_max_increment() -> f64 {
    0.15
}

fn default_time_scale() -> f64 {
    1.0
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_ms(),
            max_progress_increment: default_max_increment(),
            durations: StageDurations::default(),
            time_scale: default_time_scale(),
        }
    }
}

impl SimulationConfig {
    /// Creates a configuration with the reference cadence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time scale.
    #[must_use]
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = scale;
        self
    }

    /// Sets the tick interval.
    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    /// Sets the stage durations.
    #[must_use]
    pub fn with_durations(mut self, durations: StageDurations) -> Self {
        self.durations = durations;
        self
    }

    /// Returns the scaled duration of a stage kind.
    #[must_use]
    pub fn duration_for(&self, kind: StageKind) -> Duration {
        self.scaled(self.durations.millis_for(kind))
    }

    /// Returns the scaled tick interval.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.scaled(self.tick_interval_ms)
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn scaled(&self, ms: u64) -> Duration {
        let nanos = (ms as f64 * self.time_scale * 1_000_000.0).round().max(0.0);
        Duration::from_nanos(nanos as u64)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Whether to include span events on close.
    #[serde(default)]
    pub span_events: bool,
}

fn default_log_filter() -> String {
    "leadflow=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// Sets the filter directive.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadflowConfig {
    /// Orchestrator settings.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Simulated collaborator settings.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Qualification criteria.
    #[serde(default)]
    pub qualification: QualificationConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LeadflowConfig {
    /// Parses a JSON document and validates it.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` for malformed JSON and `Config` or
    /// `Validation` for rejected values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Applies `LEADFLOW_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable is set to an unparsable value.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies `LEADFLOW_*` overrides from a lookup function.
    ///
    /// Recognised keys: `LEADFLOW_LOG`, `LEADFLOW_LOG_FORMAT`,
    /// `LEADFLOW_EVENT_CAPACITY`, `LEADFLOW_MAX_RETAINED_PIPELINES`,
    /// `LEADFLOW_TIME_SCALE`, `LEADFLOW_TICK_MS`, `LEADFLOW_MIN_SCORE`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a variable is set to an unparsable value.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(filter) = lookup("LEADFLOW_LOG") {
            self.logging.filter = filter;
        }
        if let Some(format) = lookup("LEADFLOW_LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => {
                    return Err(LeadflowError::Config(format!(
                        "LEADFLOW_LOG_FORMAT must be 'text' or 'json', got '{other}'"
                    )))
                }
            };
        }
        if let Some(value) = lookup("LEADFLOW_EVENT_CAPACITY") {
            self.orchestrator.event_channel_capacity = parse_var("LEADFLOW_EVENT_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("LEADFLOW_MAX_RETAINED_PIPELINES") {
            self.orchestrator.max_retained_pipelines =
                Some(parse_var("LEADFLOW_MAX_RETAINED_PIPELINES", &value)?);
        }
        if let Some(value) = lookup("LEADFLOW_TIME_SCALE") {
            self.simulation.time_scale = parse_var("LEADFLOW_TIME_SCALE", &value)?;
        }
        if let Some(value) = lookup("LEADFLOW_TICK_MS") {
            self.simulation.tick_interval_ms = parse_var("LEADFLOW_TICK_MS", &value)?;
        }
        if let Some(value) = lookup("LEADFLOW_MIN_SCORE") {
            self.qualification.min_score = parse_var("LEADFLOW_MIN_SCORE", &value)?;
        }
        Ok(self)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns `Config` for out-of-range orchestrator or simulation values and
    /// `Validation` for a rejected qualification configuration.
    pub fn validate(&self) -> Result<()> {
        if self.orchestrator.event_channel_capacity == 0 {
            return Err(LeadflowError::Config(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }
        if self.orchestrator.max_retained_pipelines == Some(0) {
            return Err(LeadflowError::Config(
                "max_retained_pipelines must be greater than zero when set".to_string(),
            ));
        }
        if !self.simulation.time_scale.is_finite() || self.simulation.time_scale < 0.0 {
            return Err(LeadflowError::Config(format!(
                "time_scale must be a non-negative number, got {}",
                self.simulation.time_scale
            )));
        }
        let increment = self.simulation.max_progress_increment;
        if !(increment > 0.0 && increment <= 1.0) {
            return Err(LeadflowError::Config(format!(
                "max_progress_increment must be in (0, 1], got {increment}"
            )));
        }
        if self.simulation.tick_interval_ms == 0 {
            return Err(LeadflowError::Config(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        self.qualification.validate()?;
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| LeadflowError::Config(format!("{key}: cannot parse '{value}': {e}")))
}
