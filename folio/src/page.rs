//! Page assembly.
//!
//! ## State machine
//!
//! ```text
//! Idle → Loading(0..n) → Initializing(sync → async → final) → Ready
//! ```
//!
//! `Ready` is terminal. Failures at any fragment or initializer are absorbed
//! into the [`PageReport`]; the machine always reaches `Ready`.

use crate::coordinator::{InitReport, InitStep, InitializationCoordinator};
use crate::fragment::{Container, FragmentFetcher, LoadReport, SequentialLoader};
use crate::modules::{DeferredModuleLoader, ModuleSource};
use crate::options::SiteOptions;
use crate::pipeline::TaskFailure;
use crate::registry::InitializerRegistry;
use chrono::{DateTime, Utc};
use folio_shared::errors::FolioResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Observable pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    /// Fetching the fragment at this index of the sequence.
    Loading(usize),
    Initializing(InitStep),
    Ready,
}

/// Everything recorded while assembling a page.
#[derive(Debug, Clone)]
pub struct PageReport {
    pub started_at: DateTime<Utc>,
    pub total_duration_ms: u128,
    pub load: LoadReport,
    pub init: InitReport,
}

impl PageReport {
    /// All recorded failures: fragments first, then initializers.
    pub fn failures(&self) -> Vec<(&str, &TaskFailure)> {
        let mut failures: Vec<(&str, &TaskFailure)> = self
            .load
            .failures
            .iter()
            .map(|f| (f.name.as_str(), &f.failure))
            .collect();
        failures.extend(self.init.failures());
        failures
    }
}

/// Assembles a page: loads fragments, then runs initializers.
///
/// # Example
///
/// ```ignore
/// let registry = Arc::new(InitializerRegistry::new());
/// let page = PageBuilder::new(options, fetcher, registry, modules)?
///     .build()
///     .await;
/// assert_eq!(page.state(), PipelineState::Ready);
/// ```
pub struct PageBuilder {
    options: SiteOptions,
    fetcher: Arc<dyn FragmentFetcher>,
    registry: Arc<InitializerRegistry>,
    modules: Arc<DeferredModuleLoader>,
    state: Arc<watch::Sender<PipelineState>>,
}

impl PageBuilder {
    /// Validate options and prepare the pipeline.
    ///
    /// Deferred modules come from `module_source` and register into
    /// `registry` when loaded.
    pub fn new(
        options: SiteOptions,
        fetcher: Arc<dyn FragmentFetcher>,
        registry: Arc<InitializerRegistry>,
        module_source: Arc<dyn ModuleSource>,
    ) -> FolioResult<Self> {
        options.sanitize()?;

        let modules = Arc::new(DeferredModuleLoader::new(
            module_source,
            Arc::clone(&registry),
        ));
        let (state, _) = watch::channel(PipelineState::Idle);

        Ok(Self {
            options,
            fetcher,
            registry,
            modules,
            state: Arc::new(state),
        })
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Run the pipeline once. Consumes the builder.
    pub async fn build(self) -> Page {
        let PageBuilder {
            options,
            fetcher,
            registry,
            modules,
            state,
        } = self;

        let started_at = Utc::now();
        let total_start = Instant::now();
        tracing::info!(fragments = options.fragments.len(), "Assembling page");

        let mut container = Container::new();
        let load = SequentialLoader::new(fetcher)
            .with_progress(Arc::clone(&state))
            .load(&options.fragments, &mut container)
            .await;

        let container = Arc::new(container);
        let init = InitializationCoordinator::new(registry, Arc::clone(&modules))
            .with_features(options.deferred_features.clone())
            .with_parallel_features(options.parallel_features)
            .with_module_timeout(options.module_timeout())
            .with_progress(Arc::clone(&state))
            .run(Arc::clone(&container))
            .await;

        state.send_replace(PipelineState::Ready);

        let report = PageReport {
            started_at,
            total_duration_ms: total_start.elapsed().as_millis(),
            load,
            init,
        };

        tracing::info!(
            loaded = report.load.loaded.len(),
            failures = report.failures().len(),
            duration_ms = report.total_duration_ms as u64,
            "Page ready"
        );

        Page {
            container,
            report,
            modules,
            state: state.subscribe(),
        }
    }
}

/// A fully assembled page.
pub struct Page {
    container: Arc<Container>,
    report: PageReport,
    modules: Arc<DeferredModuleLoader>,
    state: watch::Receiver<PipelineState>,
}

impl Page {
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn report(&self) -> &PageReport {
        &self.report
    }

    pub fn modules(&self) -> &Arc<DeferredModuleLoader> {
        &self.modules
    }

    pub fn state(&self) -> PipelineState {
        *self.state.borrow()
    }
}
