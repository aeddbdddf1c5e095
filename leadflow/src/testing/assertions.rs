//! Test assertions for pipeline snapshots and event streams.

use crate::core::{PipelineEvent, PipelineId, PipelineStatus, StageStatus};
use crate::pipeline::PipelineSnapshot;

/// Asserts that the pipeline has the expected status.
pub fn assert_pipeline_status(snapshot: &PipelineSnapshot, expected: PipelineStatus) {
    assert_eq!(
        snapshot.status, expected,
        "Expected pipeline '{}' to be {expected}, got {} (error: {:?})",
        snapshot.name, snapshot.status, snapshot.error
    );
}

/// Asserts the status of every stage, in definition order.
pub fn assert_stage_statuses(snapshot: &PipelineSnapshot, expected: &[StageStatus]) {
    let actual: Vec<StageStatus> = snapshot.stages.iter().map(|s| s.status).collect();
    assert_eq!(actual, expected, "Unexpected stage statuses");
}

/// Asserts that the event types appear in `events` in this relative order.
pub fn assert_event_order(events: &[PipelineEvent], expected: &[&str]) {
    let mut remaining = expected.iter().peekable();
    for event in events {
        if remaining.peek().is_some_and(|next| **next == event.event_type()) {
            remaining.next();
        }
    }
    let missing: Vec<&&str> = remaining.collect();
    assert!(
        missing.is_empty(),
        "Events out of order or missing: {missing:?} in {:?}",
        events.iter().map(PipelineEvent::event_type).collect::<Vec<_>>()
    );
}

/// Asserts that no stage reports progress after its `StageFinished` event,
/// and that reported progress never decreases.
pub fn assert_no_progress_after_finish(events: &[PipelineEvent]) {
    let mut finished: Vec<(PipelineId, &str)> = Vec::new();
    let mut last: Vec<((PipelineId, &str), f64)> = Vec::new();

    for event in events {
        match event {
            PipelineEvent::StageProgress {
                pipeline_id,
                stage,
                progress,
                ..
            } => {
                let key = (*pipeline_id, stage.as_str());
                assert!(
                    !finished.contains(&key),
                    "Progress {progress} for stage '{stage}' after it finished"
                );
                match last.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, previous)) => {
                        assert!(
                            *progress >= *previous,
                            "Progress for '{stage}' decreased from {previous} to {progress}"
                        );
                        *previous = *progress;
                    }
                    None => last.push((key, *progress)),
                }
            }
            PipelineEvent::StageFinished {
                pipeline_id, stage, ..
            } => finished.push((*pipeline_id, stage.as_str())),
            _ => {}
        }
    }
}
