//! Sequential fragment loading.
//!
//! Fragments are fetched one at a time, in declared order, as a single
//! sequential pipeline stage. Later fragments may depend on earlier ones being
//! in the container, so no two fetches ever overlap.

use super::{Container, FragmentFetcher, FragmentName, LoadOutcome};
use crate::page::PipelineState;
use crate::pipeline::{
    BoxedTask, ExecutionPlan, PipelineBuilder, PipelineExecutor, PipelineMetrics, PipelineTask,
    Stage, TaskFailure, TaskStatus,
};
use async_trait::async_trait;
use folio_shared::errors::FolioResult;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// A fragment that was attempted and left out of the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentLoadFailure {
    pub name: FragmentName,
    pub failure: TaskFailure,
}

/// Outcome of a load phase.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Number of fragments attempted (always the full sequence).
    pub attempted: usize,
    /// Fragments appended to the container, in order.
    pub loaded: Vec<FragmentName>,
    pub failures: Vec<FragmentLoadFailure>,
    pub metrics: PipelineMetrics,
}

impl LoadReport {
    fn from_metrics(names: &[FragmentName], metrics: PipelineMetrics) -> Self {
        let mut loaded = Vec::new();
        let mut failures = Vec::new();

        let tasks = metrics.stages.iter().flat_map(|stage| stage.tasks.iter());
        for (name, task) in names.iter().zip(tasks) {
            match &task.status {
                TaskStatus::Failed(failure) => failures.push(FragmentLoadFailure {
                    name: name.clone(),
                    failure: failure.clone(),
                }),
                _ => loaded.push(name.clone()),
            }
        }

        Self {
            attempted: names.len(),
            loaded,
            failures,
            metrics,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

struct LoadContext {
    container: Container,
    fetcher: Arc<dyn FragmentFetcher>,
    progress: Option<Arc<watch::Sender<PipelineState>>>,
}

type LoadCtx = Arc<Mutex<LoadContext>>;

struct FragmentTask {
    index: usize,
    name: FragmentName,
}

#[async_trait]
impl PipelineTask<LoadCtx> for FragmentTask {
    async fn run(self: Box<Self>, ctx: LoadCtx) -> FolioResult<TaskStatus> {
        let (fetcher, progress) = {
            let ctx = ctx.lock().await;
            (Arc::clone(&ctx.fetcher), ctx.progress.clone())
        };

        if let Some(progress) = progress {
            progress.send_replace(PipelineState::Loading(self.index));
        }
        tracing::debug!(fragment = %self.name, index = self.index, "Loading fragment");

        match fetcher.fetch(&self.name).await {
            LoadOutcome::Loaded(content) => {
                let mut ctx = ctx.lock().await;
                ctx.container.append(self.name, content);
                Ok(TaskStatus::Completed)
            }
            LoadOutcome::Failed(e) => Err(e),
        }
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Loads a fixed, ordered fragment sequence into a container.
pub struct SequentialLoader {
    fetcher: Arc<dyn FragmentFetcher>,
    progress: Option<Arc<watch::Sender<PipelineState>>>,
}

impl SequentialLoader {
    pub fn new(fetcher: Arc<dyn FragmentFetcher>) -> Self {
        Self {
            fetcher,
            progress: None,
        }
    }

    /// Publish `PipelineState::Loading(index)` before each fetch.
    pub(crate) fn with_progress(mut self, progress: Arc<watch::Sender<PipelineState>>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Attempt every fragment in order, appending successes to `container`.
    ///
    /// Returns only after the whole sequence has been attempted. Failed
    /// fragments leave nothing in the container and are listed in the report.
    pub async fn load(&self, names: &[FragmentName], container: &mut Container) -> LoadReport {
        let ctx: LoadCtx = Arc::new(Mutex::new(LoadContext {
            container: std::mem::take(container),
            fetcher: Arc::clone(&self.fetcher),
            progress: self.progress.clone(),
        }));

        let tasks: Vec<BoxedTask<LoadCtx>> = names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                Box::new(FragmentTask {
                    index,
                    name: name.clone(),
                }) as BoxedTask<LoadCtx>
            })
            .collect();

        let plan = ExecutionPlan::new(vec![Stage::sequential(tasks).named("fragments")]);
        let metrics = PipelineExecutor::execute(PipelineBuilder::from_plan(plan), Arc::clone(&ctx)).await;

        *container = std::mem::take(&mut ctx.lock().await.container);

        let report = LoadReport::from_metrics(names, metrics);
        tracing::info!(
            attempted = report.attempted,
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            duration_ms = report.metrics.total_duration_ms as u64,
            "Fragment load phase finished"
        );
        report
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{MapFetcher, names};
    use super::*;
    use folio_shared::errors::FailureKind;

    #[tokio::test]
    async fn test_failed_fragment_skipped_in_order() {
        let fetcher = Arc::new(MapFetcher::with(&[
            ("header", "<header></header>"),
            ("about", "<section id=\"about\"></section>"),
        ]));
        let loader = SequentialLoader::new(fetcher.clone());
        let mut container = Container::new();

        let report = loader
            .load(&names(&["header", "hero", "about"]), &mut container)
            .await;

        assert_eq!(
            container.html(),
            "<header></header><section id=\"about\"></section>"
        );
        assert_eq!(*fetcher.requests.lock(), vec!["header", "hero", "about"]);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.loaded, names(&["header", "about"]));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name.as_str(), "hero");
        assert_eq!(report.failures[0].failure.kind, FailureKind::Fetch);
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_all_failures_leave_container_empty() {
        let loader = SequentialLoader::new(Arc::new(MapFetcher::default()));
        let mut container = Container::new();

        let report = loader.load(&names(&["a", "b"]), &mut container).await;

        assert!(container.is_empty());
        assert_eq!(report.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_progress_reports_last_index() {
        let (tx, rx) = watch::channel(PipelineState::Idle);
        let loader = SequentialLoader::new(Arc::new(MapFetcher::with(&[("a", "A"), ("b", "B")])))
            .with_progress(Arc::new(tx));
        let mut container = Container::new();

        loader.load(&names(&["a", "b"]), &mut container).await;

        assert_eq!(*rx.borrow(), PipelineState::Loading(1));
        assert_eq!(container.html(), "AB");
    }
}
