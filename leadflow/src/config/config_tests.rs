//! Tests for configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::Write;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = LeadflowConfig::default();
    assert_eq!(config.orchestrator.event_channel_capacity, 1024);
    assert_eq!(config.simulation.tick_interval_ms, 500);
    assert_eq!(config.simulation.durations.scrape_ms, 15_000);
    assert_eq!(config.logging.format, LogFormat::Text);
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_empty_json_uses_defaults() {
    let config = LeadflowConfig::from_json_str("{}").unwrap();
    assert_eq!(config, LeadflowConfig::default());
}

#[test]
fn test_partial_json() {
    let config = LeadflowConfig::from_json_str(
        r#"{
            "orchestrator": {"max_retained_pipelines": 10},
            "simulation": {"time_scale": 0.01, "durations": {"scrape_ms": 100}},
            "logging": {"format": "json"}
        }"#,
    )
    .unwrap();

    assert_eq!(config.orchestrator.max_retained_pipelines, Some(10));
    assert_eq!(config.simulation.durations.scrape_ms, 100);
    assert_eq!(config.simulation.durations.filter_ms, 8_000);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(
        config.simulation.duration_for(StageKind::Scrape),
        Duration::from_millis(1)
    );
}

#[test]
fn test_malformed_json_is_serialization_error() {
    let err = LeadflowConfig::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, LeadflowError::Serialization(_)));
}

#[test]
fn test_invalid_values_rejected() {
    let err = LeadflowConfig::from_json_str(r#"{"orchestrator": {"event_channel_capacity": 0}}"#)
        .unwrap_err();
    assert!(matches!(err, LeadflowError::Config(_)));

    let err = LeadflowConfig::from_json_str(r#"{"simulation": {"max_progress_increment": 2.0}}"#)
        .unwrap_err();
    assert!(matches!(err, LeadflowError::Config(_)));

    let err = LeadflowConfig::from_json_str(
        r#"{"qualification": {"criteria": [{"criterion": "revenue", "weight": 0.0}]}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, LeadflowError::Validation(_)));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"logging": {{"filter": "leadflow=debug"}}}}"#).unwrap();

    let config = LeadflowConfig::from_file(file.path()).unwrap();
    assert_eq!(config.logging.filter, "leadflow=debug");
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = LeadflowConfig::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, LeadflowError::Io(_)));
}

#[test]
fn test_env_overrides() {
    let config = LeadflowConfig::default()
        .with_overrides_from(lookup(&[
            ("LEADFLOW_LOG", "leadflow=trace"),
            ("LEADFLOW_LOG_FORMAT", "JSON"),
            ("LEADFLOW_MAX_RETAINED_PIPELINES", "25"),
            ("LEADFLOW_TIME_SCALE", "0.5"),
            ("LEADFLOW_MIN_SCORE", "55"),
        ]))
        .unwrap();

    assert_eq!(config.logging.filter, "leadflow=trace");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.orchestrator.max_retained_pipelines, Some(25));
    assert!((config.simulation.time_scale - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.qualification.min_score, 55);
}

#[test]
fn test_env_override_parse_error() {
    let err = LeadflowConfig::default()
        .with_overrides_from(lookup(&[("LEADFLOW_TICK_MS", "soon")]))
        .unwrap_err();
    assert!(err.to_string().contains("LEADFLOW_TICK_MS"));

    let err = LeadflowConfig::default()
        .with_overrides_from(lookup(&[("LEADFLOW_LOG_FORMAT", "xml")]))
        .unwrap_err();
    assert!(matches!(err, LeadflowError::Config(_)));
}
