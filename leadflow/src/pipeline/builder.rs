//! Pipeline builder with validation.

use super::{PipelineDefinition, StageSpec};
use crate::core::StageKind;
use crate::errors::{ContractErrorInfo, PipelineValidationError};
use crate::stages::Stage;
use std::collections::HashSet;
use std::sync::Arc;

/// Builder for validated pipeline definitions.
///
/// Each stage is checked as it is added: names must be unique and the kind
/// a stage consumes must have been added earlier.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<StageSpec>,
    names: HashSet<String>,
    kinds: HashSet<StageKind>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            names: HashSet::new(),
            kinds: HashSet::new(),
        }
    }

    /// Adds a stage named after its runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the stage's input kind has
    /// not been added yet.
    pub fn stage(self, runner: Arc<dyn Stage>) -> Result<Self, PipelineValidationError> {
        self.add_stage_spec(StageSpec::new(runner))
    }

    /// Adds a stage under an explicit name.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the stage's input kind has
    /// not been added yet.
    pub fn named_stage(
        self,
        name: impl Into<String>,
        runner: Arc<dyn Stage>,
    ) -> Result<Self, PipelineValidationError> {
        self.add_stage_spec(StageSpec::new(runner).with_name(name))
    }

    /// Adds a stage specification.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn add_stage_spec(mut self, spec: StageSpec) -> Result<Self, PipelineValidationError> {
        if spec.name.trim().is_empty() {
            return Err(PipelineValidationError::new("Stage name cannot be empty")
                .with_error_info(
                    ContractErrorInfo::new("DEFINITION-NAME", "Blank stage name")
                        .with_fix_hint("Give every stage a non-blank name."),
                ));
        }

        if self.names.contains(&spec.name) {
            return Err(PipelineValidationError::new(format!(
                "Duplicate stage name '{}'",
                spec.name
            ))
            .with_stages(vec![spec.name.clone()])
            .with_error_info(
                ContractErrorInfo::new(
                    "DEFINITION-DUPLICATE",
                    format!("Stage '{}' is defined twice", spec.name),
                )
                .with_fix_hint("Rename one of the stages."),
            ));
        }

        if let Some(input) = spec.kind.consumes() {
            if !self.kinds.contains(&input) {
                return Err(PipelineValidationError::new(format!(
                    "Stage '{}' ({}) needs a {} stage before it",
                    spec.name, spec.kind, input
                ))
                .with_stages(vec![spec.name.clone()])
                .with_error_info(
                    ContractErrorInfo::new(
                        "DEFINITION-WIRING",
                        format!("No upstream {input} stage"),
                    )
                    .with_fix_hint(format!(
                        "Add a {input} stage before '{}'.",
                        spec.name
                    ))
                    .with_context_entry("stage", spec.name.clone())
                    .with_context_entry("consumes", input.to_string()),
                ));
            }
        }

        self.names.insert(spec.name.clone());
        self.kinds.insert(spec.kind);
        self.stages.push(spec);
        Ok(self)
    }

    /// Builds the definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline name is blank or there are no stages.
    pub fn build(self) -> Result<PipelineDefinition, PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(
                PipelineValidationError::new("Pipeline name cannot be empty or whitespace-only")
                    .with_error_info(
                        ContractErrorInfo::new("DEFINITION-NAME", "Blank pipeline name")
                            .with_fix_hint("Pass a descriptive name to PipelineBuilder::new."),
                    ),
            );
        }

        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no stages")
                .with_error_info(
                    ContractErrorInfo::new("DEFINITION-EMPTY", "Cannot build an empty pipeline")
                        .with_fix_hint("Add at least one stage to the pipeline before building."),
                ));
        }

        Ok(PipelineDefinition::new(self.name, self.stages))
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStage;

    fn stage(kind: StageKind) -> Arc<dyn Stage> {
        Arc::new(ScriptedStage::succeeding(kind))
    }

    #[test]
    fn test_build_full_chain() {
        let definition = StageKind::ALL
            .iter()
            .try_fold(PipelineBuilder::new("leads"), |b, kind| b.stage(stage(*kind)))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(definition.len(), 6);
        assert_eq!(
            definition.stage_names(),
            vec!["scrape", "filter", "qualify", "sync", "quality", "report"]
        );
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineBuilder::new("empty").build().unwrap_err();
        assert_eq!(err.code(), Some("DEFINITION-EMPTY"));
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = PipelineBuilder::new("  ")
            .stage(stage(StageKind::Scrape))
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some("DEFINITION-NAME"));
    }

    #[test]
    fn test_duplicate_stage_rejected() {
        let err = PipelineBuilder::new("dup")
            .stage(stage(StageKind::Scrape))
            .unwrap()
            .stage(stage(StageKind::Scrape))
            .unwrap_err();
        assert_eq!(err.code(), Some("DEFINITION-DUPLICATE"));
        assert_eq!(err.stages, vec!["scrape".to_string()]);
    }

    #[test]
    fn test_wiring_requires_upstream_kind() {
        let err = PipelineBuilder::new("miswired")
            .stage(stage(StageKind::Scrape))
            .unwrap()
            .stage(stage(StageKind::Qualify))
            .unwrap_err();

        assert_eq!(err.code(), Some("DEFINITION-WIRING"));
        let info = err.error_info.unwrap();
        assert_eq!(info.context.get("consumes"), Some(&"filter".to_string()));
    }

    #[test]
    fn test_same_kind_twice_under_different_names() {
        let builder = PipelineBuilder::new("two-scrapes")
            .named_stage("scrape-linkedin", stage(StageKind::Scrape))
            .unwrap()
            .named_stage("scrape-directories", stage(StageKind::Scrape))
            .unwrap();
        assert_eq!(builder.stage_count(), 2);
        assert_eq!(builder.name(), "two-scrapes");
    }
}
