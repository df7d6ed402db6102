//! Generic pipeline execution framework.
//!
//! Provides a table-driven pipeline executor that can run stages containing tasks
//! in parallel or sequential mode. A failing task never aborts the pipeline:
//! its failure is logged, recorded in the metrics, and execution continues.

use super::metrics::{PipelineMetrics, StageMetrics, TaskFailure, TaskMetrics, TaskStatus};
use super::stage::{ExecutionMode, Stage};
use super::task::BoxedTask;
use folio_shared::errors::FailureKind;
use futures::FutureExt;
use futures::future::join_all;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

pub struct ExecutionPlan<Ctx> {
    stages: Vec<Stage<BoxedTask<Ctx>>>,
}

impl<Ctx> ExecutionPlan<Ctx> {
    pub fn new(stages: Vec<Stage<BoxedTask<Ctx>>>) -> Self {
        Self { stages }
    }

    pub fn stages(self) -> Vec<Stage<BoxedTask<Ctx>>> {
        self.stages
    }
}

pub struct Pipeline<Ctx> {
    stages: Vec<Stage<BoxedTask<Ctx>>>,
}

impl<Ctx> Pipeline<Ctx> {
    pub fn new(stages: Vec<Stage<BoxedTask<Ctx>>>) -> Self {
        Self { stages }
    }
}

pub struct PipelineBuilder;

impl PipelineBuilder {
    pub fn from_plan<Ctx>(plan: ExecutionPlan<Ctx>) -> Pipeline<Ctx> {
        Pipeline::new(plan.stages())
    }
}

/// Pipeline executor framework.
///
/// This provides the generic infrastructure for executing a table-driven pipeline.
/// The actual task execution logic is provided by task implementations.
pub struct PipelineExecutor;

impl PipelineExecutor {
    /// Execute a pipeline.
    ///
    /// Iterates through stages in order and executes their tasks according to
    /// the stage's execution mode. Every task is attempted; failures and panics
    /// are captured as `TaskStatus::Failed`.
    ///
    /// Generic over:
    /// - `Ctx`: Shared pipeline context (use interior mutability for writes)
    pub async fn execute<Ctx>(pipeline: Pipeline<Ctx>, ctx: Ctx) -> PipelineMetrics
    where
        Ctx: Clone,
    {
        Self::execute_observed(pipeline, ctx, |_, _| {}).await
    }

    /// Like [`execute`](Self::execute), calling `on_stage(index, label)` as
    /// each stage starts, including stages with no tasks.
    pub async fn execute_observed<Ctx, F>(
        pipeline: Pipeline<Ctx>,
        ctx: Ctx,
        on_stage: F,
    ) -> PipelineMetrics
    where
        Ctx: Clone,
        F: Fn(usize, Option<&'static str>),
    {
        let total_start = Instant::now();
        let mut stage_metrics = Vec::new();

        for (index, stage) in pipeline.stages.into_iter().enumerate() {
            let execution = stage.execution;
            let label = stage.label;
            let stage_start = Instant::now();
            on_stage(index, label);

            tracing::debug!(
                stage = index,
                label = label.unwrap_or("-"),
                mode = ?execution,
                tasks = stage.tasks.len(),
                "Starting pipeline stage"
            );

            let task_metrics = match execution {
                ExecutionMode::Parallel => {
                    let futures = stage
                        .tasks
                        .into_iter()
                        .map(|task| run_isolated(task, ctx.clone()));
                    join_all(futures).await
                }
                ExecutionMode::Sequential => {
                    let mut task_metrics = Vec::new();
                    for task in stage.tasks {
                        task_metrics.push(run_isolated(task, ctx.clone()).await);
                    }
                    task_metrics
                }
            };

            stage_metrics.push(StageMetrics {
                index,
                label,
                execution,
                duration_ms: stage_start.elapsed().as_millis(),
                tasks: task_metrics,
            });
        }

        PipelineMetrics {
            total_duration_ms: total_start.elapsed().as_millis(),
            stages: stage_metrics,
        }
    }
}

async fn run_isolated<Ctx>(task: BoxedTask<Ctx>, ctx: Ctx) -> TaskMetrics {
    let name = task.name().to_string();
    let task_start = Instant::now();

    let status = match AssertUnwindSafe(task.run(ctx)).catch_unwind().await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            tracing::error!(task = %name, error = %e, "Pipeline task failed");
            TaskStatus::Failed(TaskFailure::from_error(&e))
        }
        Err(payload) => {
            let message = format!("task panicked: {}", panic_message(payload.as_ref()));
            tracing::error!(task = %name, "{}", message);
            TaskStatus::Failed(TaskFailure {
                kind: FailureKind::Other,
                message,
            })
        }
    };

    TaskMetrics {
        name,
        duration_ms: task_start.elapsed().as_millis(),
        status,
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
