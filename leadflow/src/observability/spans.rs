//! Span helpers for pipeline execution.

use crate::core::{PipelineId, StageKind};
use tokio::time::Instant;
use tracing::Span;

/// Creates the span a pipeline's task runs in.
#[must_use]
pub fn pipeline_span(id: PipelineId, name: &str, stage_count: usize) -> Span {
    tracing::info_span!("pipeline", pipeline_id = %id, pipeline_name = name, stage_count)
}

/// Creates the span one stage's unit of work runs in.
#[must_use]
pub fn stage_span(name: &str, kind: StageKind, index: usize) -> Span {
    tracing::info_span!("stage", stage = name, kind = %kind, index)
}

/// Simple span timing helper.
///
/// Reads the tokio clock, so paused-time tests observe advanced durations.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in seconds.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_seconds() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration in seconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        let seconds = self.elapsed_seconds();
        tracing::trace!(span_name = %self.name, duration_seconds = seconds, "Span finished");
        seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_span_timer_follows_tokio_clock() {
        let timer = SpanTimer::start("scrape");
        tokio::time::advance(Duration::from_millis(1500)).await;

        assert_eq!(timer.name(), "scrape");
        assert!((timer.elapsed_ms() - 1500.0).abs() < 1.0);
        assert!((timer.finish() - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_spans_construct_without_subscriber() {
        let _pipeline = pipeline_span(PipelineId::new(), "leads", 6);
        let _stage = stage_span("scrape", StageKind::Scrape, 0);
    }
}
