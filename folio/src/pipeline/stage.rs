//! Stage definition for table-driven pipeline execution.

/// Execution mode for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Execute tasks concurrently with `join_all`
    Parallel,
    /// Execute tasks sequentially, one after another
    Sequential,
}

/// A stage contains multiple tasks and an execution mode.
///
/// Stages are executed in order, and each stage's tasks are executed
/// according to the stage's execution mode (parallel or sequential).
///
/// Generic over task type T to allow different pipeline implementations.
#[derive(Debug, Clone)]
pub struct Stage<T> {
    pub tasks: Vec<T>,
    pub execution: ExecutionMode,
    pub label: Option<&'static str>,
}

impl<T> Stage<T> {
    /// Create a stage with parallel task execution.
    pub fn parallel(tasks: Vec<T>) -> Self {
        Self {
            tasks,
            execution: ExecutionMode::Parallel,
            label: None,
        }
    }

    /// Create a stage with sequential task execution.
    pub fn sequential(tasks: Vec<T>) -> Self {
        Self {
            tasks,
            execution: ExecutionMode::Sequential,
            label: None,
        }
    }

    /// Create a stage whose mode is picked at runtime.
    pub fn with_mode(tasks: Vec<T>, execution: ExecutionMode) -> Self {
        Self {
            tasks,
            execution,
            label: None,
        }
    }

    /// Attach a label used in logs and metrics.
    pub fn named(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }
}
