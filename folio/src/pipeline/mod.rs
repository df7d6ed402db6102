//! Generic table-driven pipeline execution framework.
//!
//! This module provides the pipeline infrastructure shared by the fragment
//! loader and the initialization coordinator:
//! - Table-driven execution plans
//! - Parallel and sequential task execution modes
//! - Per-task failure isolation with typed failure records
//!
//! ## Architecture
//!
//! ```text
//! Pipeline → Stages → Tasks
//!
//! - Pipeline: Orchestrates execution of all stages, in order
//! - Stage: Groups related tasks with an execution mode (parallel/sequential)
//! - Task: Atomic unit of work; its failure never stops its siblings
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use folio::pipeline::{ExecutionPlan, PipelineBuilder, PipelineExecutor, Stage};
//!
//! let plan = ExecutionPlan::new(vec![
//!     Stage::sequential(vec![Box::new(TaskA)]).named("setup"),
//!     Stage::parallel(vec![Box::new(TaskB), Box::new(TaskC)]),
//! ]);
//!
//! let pipeline = PipelineBuilder::from_plan(plan);
//! let metrics = PipelineExecutor::execute(pipeline, ctx).await;
//! for (task, failure) in metrics.failures() {
//!     println!("{task} failed: {}", failure.message);
//! }
//! ```

mod metrics;
#[allow(clippy::module_inception)]
mod pipeline;
mod stage;
mod task;

pub use metrics::{PipelineMetrics, StageMetrics, TaskFailure, TaskMetrics, TaskStatus};
pub use pipeline::{ExecutionPlan, Pipeline, PipelineBuilder, PipelineExecutor};
pub(crate) use pipeline::panic_message;
pub use stage::{ExecutionMode, Stage};
pub use task::{BoxedTask, PipelineTask};
