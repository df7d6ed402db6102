//! Initialization coordination.
//!
//! ## Architecture
//!
//! Initialization is table-driven and runs only against a fully loaded
//! container:
//!
//! ```text
//!   1. sync    initTheme → initI18n → initMain       (sequential)
//!   2. async   initCarousel, initProjectImages, ...  (only features present
//!              in the page; module loaded on demand; sequential by default)
//!   3. final   initModal
//! ```
//!
//! Each entry is looked up in the registry; absent entries are skipped. A
//! failing entry is recorded and never prevents the others from running.

mod tasks;

use crate::fragment::Container;
use crate::modules::DeferredModuleLoader;
use crate::options::DeferredFeature;
use crate::page::PipelineState;
use crate::pipeline::{
    BoxedTask, ExecutionMode, ExecutionPlan, PipelineBuilder, PipelineExecutor, PipelineMetrics,
    Stage, TaskFailure,
};
use crate::registry::{InitializerRegistry, InitializerRole, PageView};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use tasks::{DeferredFeatureTask, InitializerTask};

/// Roles invoked before any deferred feature, in order.
pub const SYNC_ROLES: [InitializerRole; 3] = [
    InitializerRole::Theme,
    InitializerRole::I18n,
    InitializerRole::Navigation,
];

/// Roles invoked after every deferred feature, in order.
pub const FINAL_ROLES: [InitializerRole; 1] = [InitializerRole::Modal];

/// Steps in plan order; stage `i` of the execution plan is `STEPS[i]`.
const STEPS: [InitStep; 3] = [InitStep::Sync, InitStep::Async, InitStep::Final];

/// Initialization step, as published in [`PipelineState::Initializing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStep {
    Sync,
    Async,
    Final,
}

/// Shared context for initialization tasks.
pub(crate) struct InitContext {
    pub(crate) view: PageView,
    pub(crate) registry: Arc<InitializerRegistry>,
    pub(crate) modules: Arc<DeferredModuleLoader>,
    pub(crate) module_timeout: Option<Duration>,
    pub(crate) progress: Option<Arc<watch::Sender<PipelineState>>>,
    pub(crate) invoked: Mutex<Vec<InitializerRole>>,
    pub(crate) steps: Mutex<Vec<InitStep>>,
}

impl InitContext {
    pub(crate) fn enter(&self, step: InitStep) {
        self.steps.lock().push(step);
        if let Some(progress) = &self.progress {
            progress.send_replace(PipelineState::Initializing(step));
        }
    }
}

pub(crate) type InitCtx = Arc<InitContext>;

/// Outcome of the initialization phase.
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    /// Roles whose initializer was invoked, in invocation order.
    pub invoked: Vec<InitializerRole>,
    /// Deferred features found in the page, in declared order.
    pub present_features: Vec<InitializerRole>,
    /// Steps entered, in order. Every step is entered even when it has no work.
    pub steps: Vec<InitStep>,
    pub metrics: PipelineMetrics,
}

impl InitReport {
    pub fn failures(&self) -> Vec<(&str, &TaskFailure)> {
        self.metrics.failures()
    }
}

/// Runs registered initializers against a loaded container.
pub struct InitializationCoordinator {
    registry: Arc<InitializerRegistry>,
    modules: Arc<DeferredModuleLoader>,
    features: Vec<DeferredFeature>,
    execution: ExecutionMode,
    module_timeout: Option<Duration>,
    progress: Option<Arc<watch::Sender<PipelineState>>>,
}

impl InitializationCoordinator {
    pub fn new(registry: Arc<InitializerRegistry>, modules: Arc<DeferredModuleLoader>) -> Self {
        Self {
            registry,
            modules,
            features: Vec::new(),
            execution: ExecutionMode::Sequential,
            module_timeout: None,
            progress: None,
        }
    }

    /// Deferred features to look for, in order.
    pub fn with_features(mut self, features: Vec<DeferredFeature>) -> Self {
        self.features = features;
        self
    }

    /// Run structurally independent deferred features concurrently.
    pub fn with_parallel_features(mut self, parallel: bool) -> Self {
        self.execution = if parallel {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        };
        self
    }

    pub fn with_module_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.module_timeout = timeout;
        self
    }

    pub(crate) fn with_progress(mut self, progress: Arc<watch::Sender<PipelineState>>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Deferred features whose marker class occurs in `container`.
    pub fn present_features(&self, container: &Container) -> Vec<&DeferredFeature> {
        self.features
            .iter()
            .filter(|feature| {
                let present = container.has_class(&feature.marker_class);
                if !present {
                    tracing::debug!(
                        role = %feature.role,
                        marker = %feature.marker_class,
                        "Feature not present in page, module not loaded"
                    );
                }
                present
            })
            .collect()
    }

    fn get_execution_plan(&self, present: &[&DeferredFeature]) -> ExecutionPlan<InitCtx> {
        let sync: Vec<BoxedTask<InitCtx>> = SYNC_ROLES
            .iter()
            .map(|role| Box::new(InitializerTask::new(*role)) as BoxedTask<InitCtx>)
            .collect();

        let deferred: Vec<BoxedTask<InitCtx>> = present
            .iter()
            .map(|feature| {
                Box::new(DeferredFeatureTask::new((*feature).clone())) as BoxedTask<InitCtx>
            })
            .collect();

        let last: Vec<BoxedTask<InitCtx>> = FINAL_ROLES
            .iter()
            .map(|role| Box::new(InitializerTask::new(*role)) as BoxedTask<InitCtx>)
            .collect();

        ExecutionPlan::new(vec![
            Stage::sequential(sync).named("sync"),
            Stage::with_mode(deferred, self.execution).named("async"),
            Stage::sequential(last).named("final"),
        ])
    }

    /// Run every step once against `container`.
    pub async fn run(&self, container: Arc<Container>) -> InitReport {
        let present = self.present_features(&container);
        let present_features = present.iter().map(|feature| feature.role).collect();
        let plan = self.get_execution_plan(&present);

        let ctx: InitCtx = Arc::new(InitContext {
            view: PageView::new(container),
            registry: Arc::clone(&self.registry),
            modules: Arc::clone(&self.modules),
            module_timeout: self.module_timeout,
            progress: self.progress.clone(),
            invoked: Mutex::new(Vec::new()),
            steps: Mutex::new(Vec::new()),
        });

        let observer = Arc::clone(&ctx);
        let metrics = PipelineExecutor::execute_observed(
            PipelineBuilder::from_plan(plan),
            Arc::clone(&ctx),
            move |index, _| {
                if let Some(step) = STEPS.get(index) {
                    observer.enter(*step);
                }
            },
        )
        .await;
        let invoked = ctx.invoked.lock().clone();
        let steps = ctx.steps.lock().clone();

        tracing::info!(
            invoked = invoked.len(),
            failed = metrics.failures().len(),
            duration_ms = metrics.total_duration_ms as u64,
            "Initialization phase finished"
        );

        InitReport {
            invoked,
            present_features,
            steps,
            metrics,
        }
    }
}
