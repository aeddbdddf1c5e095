//! Event sinks for pipeline observers.
//!
//! Runners never block on observers: every sink is driven through
//! `try_emit`, which must not fail or panic.

mod sink;

pub use sink::{
    BroadcastEventSink, CollectingEventSink, EventSink, FanoutEventSink, LoggingEventSink,
    NoOpEventSink,
};
