use crate::pipeline::ExecutionMode;
use folio_shared::errors::{FailureKind, FolioError};

/// Recorded failure of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    pub fn from_error(err: &FolioError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Outcome of a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    /// Nothing to do (e.g. collaborator absent). Not an error.
    Skipped,
    Failed(TaskFailure),
}

impl TaskStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, TaskStatus::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct TaskMetrics {
    pub name: String,
    pub duration_ms: u128,
    pub status: TaskStatus,
}

#[derive(Debug, Clone)]
pub struct StageMetrics {
    pub index: usize,
    pub label: Option<&'static str>,
    pub execution: ExecutionMode,
    pub duration_ms: u128,
    pub tasks: Vec<TaskMetrics>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineMetrics {
    pub total_duration_ms: u128,
    pub stages: Vec<StageMetrics>,
}

impl PipelineMetrics {
    fn tasks(&self) -> impl Iterator<Item = &TaskMetrics> {
        self.stages.iter().flat_map(|stage| stage.tasks.iter())
    }

    pub fn task_duration_ms(&self, name: &str) -> Option<u128> {
        self.tasks()
            .find(|task| task.name == name)
            .map(|task| task.duration_ms)
    }

    pub fn task_status(&self, name: &str) -> Option<&TaskStatus> {
        self.tasks()
            .find(|task| task.name == name)
            .map(|task| &task.status)
    }

    /// Every recorded failure, in execution order.
    pub fn failures(&self) -> Vec<(&str, &TaskFailure)> {
        self.tasks()
            .filter_map(|task| match &task.status {
                TaskStatus::Failed(failure) => Some((task.name.as_str(), failure)),
                _ => None,
            })
            .collect()
    }

    /// Names of tasks that ran to completion, in execution order.
    pub fn completed(&self) -> Vec<&str> {
        self.tasks()
            .filter(|task| task.status == TaskStatus::Completed)
            .map(|task| task.name.as_str())
            .collect()
    }
}
