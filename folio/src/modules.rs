//! On-demand feature modules.
//!
//! A feature module's code is brought in only once the page structure it
//! targets exists. Loading a module runs its registration side effect: it
//! installs initializers into the registry. The loader guarantees each module
//! is loaded at most once successfully per loader lifetime.

use crate::registry::InitializerRegistry;
use async_trait::async_trait;
use folio_shared::errors::{FolioError, FolioResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Load path of a feature module, e.g. `js/modules/carousel.js`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleRef(String);

impl ModuleRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Code unit executed when its module is loaded.
pub trait FeatureModule: Send + Sync {
    /// Register this module's initializers.
    fn install(&self, registry: &InitializerRegistry) -> FolioResult<()>;
}

/// Something that can bring a module in and execute it.
///
/// Resolving `Ok` is the module's readiness signal.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    async fn load(&self, module: &ModuleRef, registry: &InitializerRegistry) -> FolioResult<()>;
}

/// Bundled modules keyed by load path.
///
/// With an asset root set, a module only loads if its file exists under that
/// root, mirroring a script request that 404s.
#[derive(Default)]
pub struct ModuleCatalog {
    modules: HashMap<ModuleRef, Arc<dyn FeatureModule>>,
    asset_root: Option<PathBuf>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module: ModuleRef, code: Arc<dyn FeatureModule>) -> Self {
        self.modules.insert(module, code);
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    pub fn contains(&self, module: &ModuleRef) -> bool {
        self.modules.contains_key(module)
    }
}

#[async_trait]
impl ModuleSource for ModuleCatalog {
    async fn load(&self, module: &ModuleRef, registry: &InitializerRegistry) -> FolioResult<()> {
        let code = self
            .modules
            .get(module)
            .ok_or_else(|| FolioError::ModuleLoad {
                module: module.to_string(),
                reason: "no such module".into(),
            })?;

        if let Some(root) = &self.asset_root {
            let path = root.join(module.as_str());
            tokio::fs::metadata(&path)
                .await
                .map_err(|e| FolioError::ModuleLoad {
                    module: module.to_string(),
                    reason: format!("{}: {}", path.display(), e),
                })?;
        }

        code.install(registry).map_err(|e| FolioError::ModuleLoad {
            module: module.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Exactly-once module loader.
///
/// Concurrent requests for the same module share one load. A failed load
/// leaves the module unloaded; nothing is retried automatically.
pub struct DeferredModuleLoader {
    source: Arc<dyn ModuleSource>,
    registry: Arc<InitializerRegistry>,
    cells: Mutex<HashMap<ModuleRef, Arc<OnceCell<()>>>>,
    load_counts: Mutex<HashMap<ModuleRef, usize>>,
}

impl DeferredModuleLoader {
    pub fn new(source: Arc<dyn ModuleSource>, registry: Arc<InitializerRegistry>) -> Self {
        Self {
            source,
            registry,
            cells: Mutex::new(HashMap::new()),
            load_counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<InitializerRegistry> {
        &self.registry
    }

    /// Load `module` unless it already loaded successfully.
    pub async fn ensure_loaded(&self, module: &ModuleRef) -> FolioResult<()> {
        let cell = {
            let mut cells = self.cells.lock();
            Arc::clone(cells.entry(module.clone()).or_default())
        };

        if cell.initialized() {
            tracing::trace!(module = %module, "Module already loaded");
            return Ok(());
        }

        cell.get_or_try_init(|| async {
            *self.load_counts.lock().entry(module.clone()).or_insert(0) += 1;
            tracing::debug!(module = %module, "Loading deferred module");
            self.source.load(module, &self.registry).await?;
            tracing::info!(module = %module, "Deferred module ready");
            Ok::<(), FolioError>(())
        })
        .await
        .map(|_| ())
        .inspect_err(|e| tracing::warn!(module = %module, error = %e, "Deferred module failed to load"))
    }

    /// Like [`ensure_loaded`](Self::ensure_loaded), failing if the module is not
    /// ready within `timeout`.
    pub async fn ensure_loaded_within(
        &self,
        module: &ModuleRef,
        timeout: Duration,
    ) -> FolioResult<()> {
        tokio::time::timeout(timeout, self.ensure_loaded(module))
            .await
            .map_err(|_| {
                FolioError::Timeout(format!("module '{}' not ready after {:?}", module, timeout))
            })?
    }

    pub fn is_loaded(&self, module: &ModuleRef) -> bool {
        self.cells
            .lock()
            .get(module)
            .is_some_and(|cell| cell.initialized())
    }

    /// Number of load attempts issued for `module`.
    pub fn load_count(&self, module: &ModuleRef) -> usize {
        self.load_counts.lock().get(module).copied().unwrap_or(0)
    }
}
