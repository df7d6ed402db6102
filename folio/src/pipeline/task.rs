//! Generic task trait for pipeline execution.

use super::metrics::TaskStatus;
use async_trait::async_trait;
use folio_shared::errors::FolioResult;

/// Trait for tasks that can be executed in a pipeline.
///
/// Tasks run with a shared context, which is cloned per task. Returning
/// `Err` marks the task as failed; the executor records the failure and
/// keeps going.
#[async_trait]
pub trait PipelineTask<Ctx>: Send + Sync {
    /// Execute the task with the shared pipeline context.
    async fn run(self: Box<Self>, ctx: Ctx) -> FolioResult<TaskStatus>;

    /// Get human-readable task name for logging.
    fn name(&self) -> &str;
}

pub type BoxedTask<Ctx> = Box<dyn PipelineTask<Ctx>>;
