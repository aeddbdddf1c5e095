//! Event sink trait and implementations.

use crate::core::PipelineEvent;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, Level};

/// Trait for sinks that receive pipeline events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: &PipelineEvent) {
        self.try_emit(event);
    }

    /// Tries to emit an event without blocking.
    ///
    /// This method must never panic. Delivery errors are logged and
    /// suppressed. Pipeline locks are released before this is called, so
    /// an implementation may read pipeline state back.
    fn try_emit(&self, event: &PipelineEvent);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    fn try_emit(&self, _event: &PipelineEvent) {}
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event: &PipelineEvent) {
        let event_type = event.event_type();
        let pipeline_id = event.pipeline_id();
        let stage = event.stage().unwrap_or("-");

        // Progress ticks are chatty; keep them at debug regardless of level.
        if self.level == Level::DEBUG || matches!(event, PipelineEvent::StageProgress { .. }) {
            debug!(
                event_type = %event_type,
                pipeline_id = %pipeline_id,
                stage = %stage,
                event_data = ?event,
                "Event: {}", event_type
            );
        } else {
            info!(
                event_type = %event_type,
                pipeline_id = %pipeline_id,
                stage = %stage,
                "Event: {}", event_type
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    fn try_emit(&self, event: &PipelineEvent) {
        self.log_event(event);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events whose dotted type starts with the prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type().starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Returns the events that mention the given stage.
    #[must_use]
    pub fn events_for_stage(&self, stage: &str) -> Vec<PipelineEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.stage() == Some(stage))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    fn try_emit(&self, event: &PipelineEvent) {
        self.events.write().push(event.clone());
    }
}

/// Publishes events on a tokio broadcast channel.
///
/// Slow receivers lag and lose the oldest events; the sender never waits.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<PipelineEvent>,
}

impl BroadcastEventSink {
    /// Creates a broadcast sink buffering up to `capacity` events per receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns a new receiver for events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventSink for BroadcastEventSink {
    fn try_emit(&self, event: &PipelineEvent) {
        // No receivers is not an error.
        let _ = self.sender.send(event.clone());
    }
}

/// Forwards every event to a list of sinks in order.
#[derive(Clone, Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for FanoutEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutEventSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl FanoutEventSink {
    /// Creates an empty fan-out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns the number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if there are no sinks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl EventSink for FanoutEventSink {
    fn try_emit(&self, event: &PipelineEvent) {
        for sink in &self.sinks {
            sink.try_emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PipelineId;
    use chrono::Utc;

    fn started(stage: &str) -> PipelineEvent {
        PipelineEvent::StageStarted {
            pipeline_id: PipelineId::new(),
            stage: stage.to_string(),
            index: 0,
            timestamp: Utc::now(),
        }
    }

    fn progress(stage: &str) -> PipelineEvent {
        PipelineEvent::StageProgress {
            pipeline_id: PipelineId::new(),
            stage: stage.to_string(),
            progress: 0.5,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit(&started("scrape")).await;
        sink.try_emit(&progress("scrape"));
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::default();
        sink.emit(&started("scrape")).await;
        LoggingEventSink::debug().try_emit(&progress("scrape"));
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&started("scrape")).await;
        sink.try_emit(&progress("scrape"));

        assert_eq!(sink.len(), 2);
        let events = sink.events();
        assert_eq!(events[0].event_type(), "stage.started");
        assert_eq!(events[1].event_type(), "stage.progress");
    }

    #[test]
    fn test_collecting_sink_filters() {
        let sink = CollectingEventSink::new();
        sink.try_emit(&started("scrape"));
        sink.try_emit(&progress("scrape"));
        sink.try_emit(&started("filter"));

        assert_eq!(sink.events_of_type("stage.started").len(), 2);
        assert_eq!(sink.events_for_stage("scrape").len(), 2);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_sink_delivers_to_subscribers() {
        let sink = BroadcastEventSink::new(16);
        let mut rx = sink.subscribe();
        assert_eq!(sink.receiver_count(), 1);

        sink.try_emit(&started("scrape"));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.stage(), Some("scrape"));
    }

    #[test]
    fn test_broadcast_sink_without_receivers() {
        let sink = BroadcastEventSink::new(0);
        sink.try_emit(&started("scrape"));
        assert_eq!(sink.receiver_count(), 0);
    }

    #[test]
    fn test_fanout_forwards_to_every_sink() {
        let a = Arc::new(CollectingEventSink::new());
        let b = Arc::new(CollectingEventSink::new());
        let fanout = FanoutEventSink::new()
            .with_sink(a.clone())
            .with_sink(b.clone());

        fanout.try_emit(&started("scrape"));

        assert_eq!(fanout.len(), 2);
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }
}
