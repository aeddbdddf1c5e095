//! Stage trait and implementations.
//!
//! A stage is one unit of work in a lead pipeline. It declares the kind of
//! result it produces and runs against a [`StageContext`].

mod collaborator;

pub use collaborator::{Collaborator, CollaboratorStage};

use crate::context::StageContext;
use crate::core::{StageKind, StageResult};
use crate::errors::{CollaboratorError, StageFailure};
use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the default name of the stage.
    fn name(&self) -> &str;

    /// Returns the kind of result the stage produces.
    fn kind(&self) -> StageKind;

    /// Executes the stage.
    ///
    /// # Errors
    ///
    /// Returns a `StageFailure` if the unit of work is rejected. The failure
    /// fails the owning pipeline.
    async fn run(&self, ctx: &StageContext) -> Result<StageResult, StageFailure>;
}

/// A simple function-based stage.
pub struct FnStage<F>
where
    F: Fn(&StageContext) -> Result<StageResult, CollaboratorError> + Send + Sync,
{
    name: String,
    kind: StageKind,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&StageContext) -> Result<StageResult, CollaboratorError> + Send + Sync,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, kind: StageKind, func: F) -> Self {
        Self {
            name: name.into(),
            kind,
            func,
        }
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&StageContext) -> Result<StageResult, CollaboratorError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&StageContext) -> Result<StageResult, CollaboratorError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, ctx: &StageContext) -> Result<StageResult, StageFailure> {
        (self.func)(ctx).map_err(|cause| StageFailure::new(ctx.stage_name(), cause))
    }
}

/// An async function-based stage.
///
/// The closure receives an owned clone of the context.
pub struct AsyncFnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StageResult, CollaboratorError>> + Send,
{
    name: String,
    kind: StageKind,
    func: F,
    _phantom: std::marker::PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncFnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StageResult, CollaboratorError>> + Send,
{
    /// Creates a new async function-based stage.
    pub fn new(name: impl Into<String>, kind: StageKind, func: F) -> Self {
        Self {
            name: name.into(),
            kind,
            func,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, Fut> Debug for AsyncFnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StageResult, CollaboratorError>> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnStage")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> Stage for AsyncFnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StageResult, CollaboratorError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        self.kind
    }

    async fn run(&self, ctx: &StageContext) -> Result<StageResult, StageFailure> {
        (self.func)(ctx.clone())
            .await
            .map_err(|cause| StageFailure::new(ctx.stage_name(), cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PipelineId, ScrapeResult};

    fn ctx(name: &str) -> StageContext {
        StageContext::new(PipelineId::new(), name, StageKind::Scrape)
    }

    #[tokio::test]
    async fn test_fn_stage() {
        let stage = FnStage::new("scrape", StageKind::Scrape, |_ctx| {
            Ok(StageResult::Scrape(ScrapeResult {
                total_leads: 10,
                sources: Vec::new(),
            }))
        });

        assert_eq!(stage.name(), "scrape");
        assert_eq!(stage.kind(), StageKind::Scrape);

        let result = stage.run(&ctx("scrape")).await.unwrap();
        assert_eq!(result.as_scrape().map(|r| r.total_leads), Some(10));
    }

    #[tokio::test]
    async fn test_fn_stage_failure_carries_stage_name() {
        let stage = FnStage::new("scrape", StageKind::Scrape, |_ctx| {
            Err(CollaboratorError::NoDataFound)
        });

        let err = stage.run(&ctx("my-scrape")).await.unwrap_err();
        assert_eq!(err.stage, "my-scrape");
        assert_eq!(err.cause, CollaboratorError::NoDataFound);
    }

    #[tokio::test]
    async fn test_async_fn_stage() {
        let stage = AsyncFnStage::new("scrape", StageKind::Scrape, |ctx: StageContext| async move {
            ctx.report_progress(0.5);
            Ok(StageResult::Scrape(ScrapeResult::default()))
        });

        assert!(format!("{stage:?}").contains("AsyncFnStage"));
        assert!(stage.run(&ctx("scrape")).await.is_ok());
    }
}
