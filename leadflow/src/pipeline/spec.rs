//! Stage and pipeline definitions.

use crate::core::StageKind;
use crate::stages::Stage;
use std::sync::Arc;

/// Specification for a single stage in a pipeline.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// The unique name of the stage.
    pub name: String,
    /// The kind of result the stage produces.
    pub kind: StageKind,
    /// The stage implementation.
    pub runner: Arc<dyn Stage>,
}

impl StageSpec {
    /// Creates a spec named after the runner.
    #[must_use]
    pub fn new(runner: Arc<dyn Stage>) -> Self {
        Self {
            name: runner.name().to_string(),
            kind: runner.kind(),
            runner,
        }
    }

    /// Overrides the stage name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// A validated, ordered list of stages.
///
/// Definitions are immutable and cheap to clone; every pipeline created from
/// one gets fresh stage records.
#[derive(Debug, Clone)]
pub struct PipelineDefinition {
    name: String,
    stages: Arc<[StageSpec]>,
}

impl PipelineDefinition {
    pub(super) fn new(name: String, stages: Vec<StageSpec>) -> Self {
        Self {
            name,
            stages: stages.into(),
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the definition has no stages.
    ///
    /// Built definitions always have at least one.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
