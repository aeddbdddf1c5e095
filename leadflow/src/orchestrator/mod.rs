//! Pipeline orchestrator.
//!
//! Owns every pipeline instance, spawns one tokio task per pipeline and
//! answers lookups with point-in-time snapshots.


use crate::config::OrchestratorConfig;
use crate::context::PipelineInputs;
use crate::core::{PipelineEvent, PipelineId};
use crate::errors::{InvalidTransitionError, LeadflowError, PipelineNotFoundError, Result};
use crate::events::{BroadcastEventSink, EventSink, FanoutEventSink, LoggingEventSink};
use crate::pipeline::{run_pipeline, PipelineDefinition, PipelineHandle, PipelineSnapshot};
use dashmap::DashMap;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Reason recorded on pipelines cancelled through the orchestrator.
pub const USER_CANCEL_REASON: &str = "Cancelled by user";

#[derive(Debug)]
struct Entry {
    seq: u64,
    handle: Arc<PipelineHandle>,
}

/// Creates, tracks and cancels pipeline runs.
pub struct Orchestrator {
    config: OrchestratorConfig,
    pipelines: DashMap<PipelineId, Entry>,
    seq: AtomicU64,
    selected: RwLock<Option<PipelineId>>,
    broadcast: BroadcastEventSink,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("pipelines", &self.pipelines.len())
            .field("selected", &*self.selected.read())
            .finish_non_exhaustive()
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(OrchestratorConfig::default())
    }
}

impl Orchestrator {
    /// Creates an orchestrator.
    ///
    /// Events go to the broadcast channel behind [`Orchestrator::subscribe`],
    /// and to `tracing` when `log_events` is set.
    #[must_use]
    pub fn new(config: OrchestratorConfig) -> Self {
        let broadcast = BroadcastEventSink::new(config.event_channel_capacity);
        let mut fanout = FanoutEventSink::new().with_sink(Arc::new(broadcast.clone()));
        if config.log_events {
            fanout = fanout.with_sink(Arc::new(LoggingEventSink::info()));
        }
        Self {
            config,
            pipelines: DashMap::new(),
            seq: AtomicU64::new(0),
            selected: RwLock::new(None),
            broadcast,
            sink: Arc::new(fanout),
        }
    }

    /// Adds an observer that receives every pipeline event.
    ///
    /// Events arrive after the transition they describe is visible, so the
    /// observer may call back into the orchestrator from `try_emit`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Arc::new(FanoutEventSink::new().with_sink(self.sink).with_sink(sink));
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Registers a new pipeline run and starts executing it.
    ///
    /// Returns without waiting for any stage. The run gets fresh stage
    /// records and its own copy of the lead set in `inputs`.
    ///
    /// # Errors
    ///
    /// Returns `LeadflowError::Config` when called outside a tokio runtime.
    pub fn create_pipeline(
        &self,
        definition: &PipelineDefinition,
        inputs: PipelineInputs,
    ) -> Result<PipelineId> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LeadflowError::Config(format!("no tokio runtime available: {e}")))?;

        let id = PipelineId::new();
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let handle = PipelineHandle::new(id, definition, Arc::clone(&self.sink));
        self.pipelines.insert(
            id,
            Entry {
                seq,
                handle: Arc::clone(&handle),
            },
        );
        handle.announce(definition);
        info!(pipeline_id = %id, name = definition.name(), stages = definition.len(), "Pipeline created");

        runtime.spawn(run_pipeline(handle, definition.clone(), Arc::new(inputs.isolated())));
        self.evict_terminal();
        Ok(id)
    }

    fn handle(&self, id: PipelineId) -> Result<Arc<PipelineHandle>> {
        self.pipelines
            .get(&id)
            .map(|entry| Arc::clone(&entry.handle))
            .ok_or_else(|| PipelineNotFoundError::new(id).into())
    }

    /// Returns a snapshot of one pipeline.
    ///
    /// # Errors
    ///
    /// Returns `LeadflowError::NotFound` for an unknown id.
    pub fn get_pipeline(&self, id: PipelineId) -> Result<PipelineSnapshot> {
        Ok(self.handle(id)?.snapshot())
    }

    /// Returns snapshots of every pipeline, most recently created first.
    #[must_use]
    pub fn list_pipelines(&self) -> Vec<PipelineSnapshot> {
        let mut entries: Vec<(u64, Arc<PipelineHandle>)> = self
            .pipelines
            .iter()
            .map(|entry| (entry.seq, Arc::clone(&entry.handle)))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().map(|(_, handle)| handle.snapshot()).collect()
    }

    /// Marks a pipeline as the selected one.
    ///
    /// # Errors
    ///
    /// Returns `LeadflowError::NotFound` for an unknown id.
    pub fn select(&self, id: PipelineId) -> Result<()> {
        if !self.pipelines.contains_key(&id) {
            return Err(PipelineNotFoundError::new(id).into());
        }
        *self.selected.write() = Some(id);
        Ok(())
    }

    /// Returns the selected pipeline, if any.
    #[must_use]
    pub fn selected(&self) -> Option<PipelineSnapshot> {
        let id = (*self.selected.read())?;
        self.get_pipeline(id).ok()
    }

    /// Cancels a running pipeline.
    ///
    /// The current stage and the pipeline are `Cancelled` when this returns;
    /// later stages never run.
    ///
    /// # Errors
    ///
    /// Returns `LeadflowError::NotFound` for an unknown id and
    /// `LeadflowError::InvalidTransition` if the pipeline is already terminal.
    pub fn cancel(&self, id: PipelineId) -> Result<()> {
        self.handle(id)?.cancel(USER_CANCEL_REASON)?;
        Ok(())
    }

    /// Waits for a pipeline to reach a terminal status.
    ///
    /// # Errors
    ///
    /// Returns `LeadflowError::NotFound` for an unknown id.
    pub async fn wait(&self, id: PipelineId) -> Result<PipelineSnapshot> {
        let handle = self.handle(id)?;
        Ok(handle.wait().await)
    }

    /// Waits for several pipelines concurrently, returning their final
    /// states in the order given.
    ///
    /// # Errors
    ///
    /// Returns `LeadflowError::NotFound` if any id is unknown; nothing is
    /// awaited in that case.
    pub async fn wait_all(&self, ids: &[PipelineId]) -> Result<Vec<PipelineSnapshot>> {
        let handles = ids
            .iter()
            .map(|id| self.handle(*id))
            .collect::<Result<Vec<_>>>()?;
        Ok(join_all(handles.iter().map(|handle| handle.wait())).await)
    }

    /// Returns a receiver for events of every pipeline.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.broadcast.subscribe()
    }

    /// Drops a terminal pipeline.
    ///
    /// # Errors
    ///
    /// Returns `LeadflowError::NotFound` for an unknown id and
    /// `LeadflowError::InvalidTransition` if the pipeline is still running.
    pub fn remove(&self, id: PipelineId) -> Result<PipelineSnapshot> {
        let snapshot = self.get_pipeline(id)?;
        if !snapshot.is_terminal() {
            return Err(InvalidTransitionError::new(
                format!("pipeline '{id}'"),
                "remove",
                snapshot.status,
            )
            .into());
        }
        self.pipelines.remove(&id);
        let mut selected = self.selected.write();
        if *selected == Some(id) {
            *selected = None;
        }
        debug!(pipeline_id = %id, "Pipeline removed");
        Ok(snapshot)
    }

    /// Returns the number of tracked pipelines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Returns true if no pipeline is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    /// Drops the oldest terminal pipelines beyond `max_retained_pipelines`.
    fn evict_terminal(&self) {
        let Some(max) = self.config.max_retained_pipelines else {
            return;
        };
        let excess = self.pipelines.len().saturating_sub(max);
        if excess == 0 {
            return;
        }

        let mut terminal: Vec<(u64, PipelineId)> = self
            .pipelines
            .iter()
            .filter(|entry| entry.handle.is_terminal())
            .map(|entry| (entry.seq, *entry.key()))
            .collect();
        terminal.sort_unstable();

        for (_, id) in terminal.into_iter().take(excess) {
            if self.remove(id).is_ok() {
                debug!(pipeline_id = %id, "Evicted terminal pipeline");
            }
        }
    }
}
