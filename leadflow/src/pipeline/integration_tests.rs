//! End-to-end tests for pipeline execution.

use crate::collaborators::{Collaborators, InMemoryScraper};
use crate::config::OrchestratorConfig;
use crate::context::{PipelineInputs, StageContext};
use crate::core::{
    PipelineEvent, PipelineStatus, ScrapeResult, StageKind, StageResult, StageStatus,
};
use crate::errors::CollaboratorError;
use crate::events::CollectingEventSink;
use crate::leads::FilterSpec;
use crate::orchestrator::Orchestrator;
use crate::pipeline::{PipelineBuilder, StageRecord};
use crate::qualification::QualificationConfig;
use crate::stages::AsyncFnStage;
use crate::testing::{
    assert_event_order, assert_no_progress_after_finish, assert_pipeline_status,
    assert_stage_statuses, mock_inputs, mock_leads, reference_definition, ScriptedStage,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

fn orchestrator_with_sink() -> (Orchestrator, Arc<CollectingEventSink>) {
    let sink = Arc::new(CollectingEventSink::new());
    let orchestrator =
        Orchestrator::new(OrchestratorConfig::new().with_log_events(false)).with_sink(sink.clone());
    (orchestrator, sink)
}

fn collaborators() -> Collaborators {
    Collaborators::in_memory(QualificationConfig::default().with_reference_year(2024)).unwrap()
}

#[tokio::test]
async fn test_failed_stage_halts_later_stages() {
    let (orchestrator, sink) = orchestrator_with_sink();
    let third = Arc::new(ScriptedStage::succeeding(StageKind::Qualify));
    let definition = PipelineBuilder::new("halting")
        .stage(Arc::new(ScriptedStage::succeeding(StageKind::Scrape)))
        .unwrap()
        .stage(Arc::new(ScriptedStage::failing(
            StageKind::Filter,
            CollaboratorError::rejected("filter service down"),
        )))
        .unwrap()
        .stage(third.clone())
        .unwrap()
        .build()
        .unwrap();

    let id = orchestrator.create_pipeline(&definition, PipelineInputs::default()).unwrap();
    let snapshot = orchestrator.wait(id).await.unwrap();

    assert_pipeline_status(&snapshot, PipelineStatus::Failed);
    assert_stage_statuses(
        &snapshot,
        &[StageStatus::Completed, StageStatus::Failed, StageStatus::Pending],
    );
    assert_eq!(third.call_count(), 0);
    assert!(snapshot.error.unwrap().contains("filter service down"));
    assert!(sink.events_for_stage("qualify").is_empty());
    assert_eq!(snapshot.counters.total_leads, 2847);
    assert_eq!(snapshot.counters.qualified_leads, 0);
}

#[tokio::test]
async fn test_progress_is_monotonic_and_clamped() {
    let (orchestrator, sink) = orchestrator_with_sink();
    let definition = PipelineBuilder::new("progress")
        .stage(Arc::new(
            ScriptedStage::succeeding(StageKind::Scrape).with_progress([0.2, 0.6, 0.3, 1.4]),
        ))
        .unwrap()
        .build()
        .unwrap();

    let id = orchestrator.create_pipeline(&definition, PipelineInputs::default()).unwrap();
    orchestrator.wait(id).await.unwrap();

    let reported: Vec<f64> = sink
        .events_of_type("stage.progress")
        .iter()
        .filter_map(|event| match event {
            PipelineEvent::StageProgress { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert_eq!(reported, vec![0.2, 0.6, 1.0]);
    assert_no_progress_after_finish(&sink.events());
}

#[tokio::test]
async fn test_progress_after_completion_is_dropped() {
    let (orchestrator, sink) = orchestrator_with_sink();
    let kept: Arc<Mutex<Option<StageContext>>> = Arc::new(Mutex::new(None));
    let slot = kept.clone();
    let stage = AsyncFnStage::new("scrape", StageKind::Scrape, move |ctx: StageContext| {
        let slot = slot.clone();
        async move {
            ctx.report_progress(0.5);
            *slot.lock() = Some(ctx);
            Ok::<_, CollaboratorError>(StageResult::Scrape(ScrapeResult {
                total_leads: 3,
                sources: Vec::new(),
            }))
        }
    });
    let definition = PipelineBuilder::new("late").stage(Arc::new(stage)).unwrap().build().unwrap();

    let id = orchestrator.create_pipeline(&definition, PipelineInputs::default()).unwrap();
    orchestrator.wait(id).await.unwrap();

    let late = kept.lock().take().unwrap();
    late.report_progress(0.9);

    assert_eq!(sink.events_of_type("stage.progress").len(), 1);
    assert_no_progress_after_finish(&sink.events());
    let snapshot = orchestrator.get_pipeline(id).unwrap();
    assert!((snapshot.stages[0].progress - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_completion_is_not_repeatable() {
    let mut record = StageRecord::new("scrape", StageKind::Scrape);
    record.start().unwrap();
    record
        .complete(
            StageResult::Scrape(ScrapeResult {
                total_leads: 2847,
                sources: Vec::new(),
            }),
            15.0,
        )
        .unwrap();

    let second = record.complete(
        StageResult::Scrape(ScrapeResult {
            total_leads: 1,
            sources: Vec::new(),
        }),
        1.0,
    );

    assert!(second.is_err());
    assert_eq!(
        record.result.as_ref().and_then(StageResult::as_scrape).map(|r| r.total_leads),
        Some(2847)
    );
    assert!(record.start().is_err());
    assert!(record.fail("late").is_err());
}

#[tokio::test]
async fn test_counters_project_as_stages_complete() {
    let (orchestrator, _sink) = orchestrator_with_sink();
    let gate = Arc::new(Notify::new());
    let definition = PipelineBuilder::new("projection")
        .stage(Arc::new(ScriptedStage::succeeding(StageKind::Scrape)))
        .unwrap()
        .stage(Arc::new(ScriptedStage::succeeding(StageKind::Filter).with_gate(gate.clone())))
        .unwrap()
        .build()
        .unwrap();

    let id = orchestrator.create_pipeline(&definition, PipelineInputs::default()).unwrap();
    assert_eq!(orchestrator.get_pipeline(id).unwrap().counters.total_leads, 0);

    let mut events = orchestrator.subscribe();
    loop {
        let event = events.recv().await.unwrap();
        if event.event_type() == "stage.started" && event.stage() == Some("filter") {
            break;
        }
    }
    assert_eq!(orchestrator.get_pipeline(id).unwrap().counters.total_leads, 2847);

    gate.notify_one();
    orchestrator.wait(id).await.unwrap();
}

#[tokio::test]
async fn test_pipelines_are_independent() {
    let (orchestrator, _sink) = orchestrator_with_sink();
    let failing = PipelineBuilder::new("a")
        .stage(Arc::new(ScriptedStage::succeeding(StageKind::Scrape)))
        .unwrap()
        .stage(Arc::new(ScriptedStage::failing(
            StageKind::Filter,
            CollaboratorError::missing_input("filter spec"),
        )))
        .unwrap()
        .build()
        .unwrap();
    let slow = PipelineBuilder::new("b")
        .stage(Arc::new(
            ScriptedStage::succeeding(StageKind::Scrape).with_delay(Duration::from_millis(10)),
        ))
        .unwrap()
        .stage(Arc::new(ScriptedStage::succeeding(StageKind::Filter)))
        .unwrap()
        .build()
        .unwrap();

    let a = orchestrator.create_pipeline(&failing, PipelineInputs::default()).unwrap();
    let b = orchestrator.create_pipeline(&slow, PipelineInputs::default()).unwrap();

    let finished = orchestrator.wait_all(&[a, b]).await.unwrap();
    let (a, b) = (&finished[0], &finished[1]);

    assert_pipeline_status(a, PipelineStatus::Failed);
    assert_pipeline_status(b, PipelineStatus::Completed);
    assert_eq!(b.counters.total_leads, 2847);
}

#[tokio::test]
async fn test_in_memory_pipeline_end_to_end() {
    let (orchestrator, sink) = orchestrator_with_sink();
    let definition = collaborators().definition("Healthcare AI Prospects").unwrap();

    let id = orchestrator.create_pipeline(&definition, mock_inputs()).unwrap();
    let snapshot = orchestrator.wait(id).await.unwrap();

    assert_pipeline_status(&snapshot, PipelineStatus::Completed);
    assert_eq!(snapshot.counters.total_leads, 6);
    assert_eq!(snapshot.counters.qualified_leads, 6);
    assert_eq!(snapshot.counters.synced_leads, 6);

    let qualify = snapshot.stage("qualify").and_then(|s| s.result.clone()).unwrap();
    let qualify = qualify.as_qualify().unwrap();
    assert_eq!((qualify.high_priority, qualify.medium_priority, qualify.low_priority), (2, 4, 0));

    let sync = snapshot.stage("sync").and_then(|s| s.result.clone()).unwrap();
    let sync = sync.as_sync().unwrap();
    assert_eq!(sync.per_destination_counts["salesforce"], 3);
    assert_eq!(sync.per_destination_counts["hubspot"], 3);

    let quality = snapshot.stage("quality").and_then(|s| s.result.clone()).unwrap();
    assert_eq!(quality.as_quality().map(|q| q.quality_score), Some(100));

    let report = snapshot.stage("report").and_then(|s| s.result.clone()).unwrap();
    let report = report.as_report().unwrap();
    assert_eq!(report.reports_generated, 5);
    assert_eq!(report.alerts_sent, 1);

    let events = sink.events();
    assert_event_order(
        &events,
        &[
            "pipeline.started",
            "stage.started",
            "stage.finished",
            "stage.started",
            "stage.finished",
            "pipeline.finished",
        ],
    );
    assert_no_progress_after_finish(&events);
}

#[tokio::test]
async fn test_filter_composition_end_to_end() {
    let (orchestrator, _sink) = orchestrator_with_sink();
    let definition = collaborators().definition("Technology, 10M+").unwrap();
    let inputs = mock_inputs().with_filter(
        FilterSpec::new()
            .with_industries(["Technology"])
            .with_min_revenue(10_000_000),
    );

    let id = orchestrator.create_pipeline(&definition, inputs).unwrap();
    let snapshot = orchestrator.wait(id).await.unwrap();

    let filter = snapshot.stage("filter").and_then(|s| s.result.clone()).unwrap();
    let filter = filter.as_filter().unwrap();
    assert_eq!(filter.filtered_leads, 1);
    assert_eq!(filter.removed_leads, 5);
    assert_eq!(snapshot.counters.synced_leads, 1);
}

#[tokio::test]
async fn test_pipelines_do_not_share_leads() {
    let (orchestrator, _sink) = orchestrator_with_sink();
    let definition = collaborators().definition("isolated").unwrap();
    let inputs = mock_inputs();

    let narrow = orchestrator
        .create_pipeline(
            &definition,
            inputs.clone().with_filter(FilterSpec::new().with_industries(["Finance"])),
        )
        .unwrap();
    let wide = orchestrator.create_pipeline(&definition, inputs.clone()).unwrap();

    assert_eq!(orchestrator.wait(narrow).await.unwrap().counters.synced_leads, 1);
    assert_eq!(orchestrator.wait(wide).await.unwrap().counters.synced_leads, 6);
    assert_eq!(inputs.leads.len(), mock_leads().len());
}

#[tokio::test]
async fn test_scrape_failure_reports_cause() {
    let (orchestrator, _sink) = orchestrator_with_sink();
    let definition = collaborators()
        .with_scraper(Arc::new(InMemoryScraper::new().with_unreachable("LinkedIn")))
        .definition("unreachable")
        .unwrap();

    let id = orchestrator.create_pipeline(&definition, mock_inputs()).unwrap();
    let snapshot = orchestrator.wait(id).await.unwrap();

    assert_pipeline_status(&snapshot, PipelineStatus::Failed);
    assert!(snapshot.error.unwrap().contains("Target unreachable: LinkedIn"));
    assert_eq!(snapshot.counters.total_leads, 0);
}

#[tokio::test]
async fn test_terminal_pipeline_rejects_transitions() {
    let (orchestrator, _sink) = orchestrator_with_sink();
    let id = orchestrator
        .create_pipeline(&reference_definition(1), PipelineInputs::default())
        .unwrap();
    orchestrator.wait(id).await.unwrap();

    assert!(orchestrator.cancel(id).is_err());
    let mut record = orchestrator.get_pipeline(id).unwrap().stages[0].clone();
    assert!(record.start().is_err());
}

#[cfg(feature = "simulation")]
#[tokio::test(start_paused = true)]
async fn test_simulated_pipeline_replays_reference_run() {
    use crate::config::SimulationConfig;

    let (orchestrator, sink) = orchestrator_with_sink();
    let definition = Collaborators::simulated(SimulationConfig::default())
        .definition("Healthcare AI Prospects")
        .unwrap();

    let id = orchestrator.create_pipeline(&definition, PipelineInputs::default()).unwrap();
    let snapshot = orchestrator.wait(id).await.unwrap();

    assert_pipeline_status(&snapshot, PipelineStatus::Completed);
    assert_eq!(snapshot.counters.total_leads, 2847);
    assert_eq!(snapshot.counters.qualified_leads, 342);
    assert_eq!(snapshot.counters.synced_leads, 298);
    assert!(!sink.events_of_type("stage.progress").is_empty());
    assert_no_progress_after_finish(&sink.events());
}
