//! Initializer registry.
//!
//! Feature code registers setup routines under a closed set of roles. The
//! coordinator looks them up by role; a missing entry means the feature is not
//! part of this build and is skipped silently.

use crate::fragment::Container;
use async_trait::async_trait;
use folio_shared::errors::FolioResult;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Role an initializer plays on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitializerRole {
    Theme,
    I18n,
    Navigation,
    Carousel,
    ProjectImages,
    Modal,
}

impl InitializerRole {
    pub const ALL: [InitializerRole; 6] = [
        InitializerRole::Theme,
        InitializerRole::I18n,
        InitializerRole::Navigation,
        InitializerRole::Carousel,
        InitializerRole::ProjectImages,
        InitializerRole::Modal,
    ];

    /// Well-known entry point name of this role.
    pub const fn global_name(self) -> &'static str {
        match self {
            InitializerRole::Theme => "initTheme",
            InitializerRole::I18n => "initI18n",
            InitializerRole::Navigation => "initMain",
            InitializerRole::Carousel => "initCarousel",
            InitializerRole::ProjectImages => "initProjectImages",
            InitializerRole::Modal => "initModal",
        }
    }

    /// Whether the role's code ships as an on-demand module.
    pub const fn is_deferred(self) -> bool {
        matches!(
            self,
            InitializerRole::Carousel | InitializerRole::ProjectImages
        )
    }
}

impl fmt::Display for InitializerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.global_name())
    }
}

/// Read-only view of the fully loaded page handed to initializers.
#[derive(Debug, Clone)]
pub struct PageView {
    container: Arc<Container>,
}

impl PageView {
    pub fn new(container: Arc<Container>) -> Self {
        Self { container }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}

/// A page feature's setup routine.
///
/// Implementations must be idempotent: running twice against the same page
/// leaves the same state as running once.
#[async_trait]
pub trait Initializer: Send + Sync {
    async fn init(&self, page: &PageView) -> FolioResult<()>;
}

struct FnInitializer<F>(F);

#[async_trait]
impl<F> Initializer for FnInitializer<F>
where
    F: Fn(&PageView) -> FolioResult<()> + Send + Sync,
{
    async fn init(&self, page: &PageView) -> FolioResult<()> {
        (self.0)(page)
    }
}

/// Injectable role → initializer map.
#[derive(Default)]
pub struct InitializerRegistry {
    entries: RwLock<HashMap<InitializerRole, Arc<dyn Initializer>>>,
}

impl fmt::Debug for InitializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializerRegistry")
            .field("roles", &self.roles())
            .finish()
    }
}

impl InitializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an initializer, returning the one it replaced.
    pub fn register(
        &self,
        role: InitializerRole,
        initializer: Arc<dyn Initializer>,
    ) -> Option<Arc<dyn Initializer>> {
        let previous = self.entries.write().insert(role, initializer);
        if previous.is_some() {
            tracing::debug!(role = %role, "Replaced registered initializer");
        } else {
            tracing::trace!(role = %role, "Registered initializer");
        }
        previous
    }

    /// Register a plain synchronous function.
    pub fn register_fn<F>(&self, role: InitializerRole, f: F) -> Option<Arc<dyn Initializer>>
    where
        F: Fn(&PageView) -> FolioResult<()> + Send + Sync + 'static,
    {
        self.register(role, Arc::new(FnInitializer(f)))
    }

    pub fn get(&self, role: InitializerRole) -> Option<Arc<dyn Initializer>> {
        self.entries.read().get(&role).cloned()
    }

    pub fn contains(&self, role: InitializerRole) -> bool {
        self.entries.read().contains_key(&role)
    }

    /// Registered roles in declaration order.
    pub fn roles(&self) -> Vec<InitializerRole> {
        let entries = self.entries.read();
        InitializerRole::ALL
            .into_iter()
            .filter(|role| entries.contains_key(role))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
