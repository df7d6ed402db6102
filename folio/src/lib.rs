//! Folio assembles a single-page site from named HTML fragments.
//!
//! Fragments are fetched strictly one after another and appended to a
//! [`Container`] in declared order. Once the container is complete, feature
//! initializers run in three steps: the synchronous group (theme, i18n,
//! navigation), deferred features whose modules are loaded only if the page
//! contains their markers, and the final group (modal). A failing fragment or
//! initializer is recorded and never stops the rest of the page.
//!
//! ```ignore
//! let options = SiteOptions::default();
//! let features = StandardFeatures::new(prefs, catalog, assets);
//! let registry = Arc::new(InitializerRegistry::new());
//! features.register(&registry);
//!
//! let page = PageBuilder::new(
//!     options.clone(),
//!     Arc::new(DirFragmentFetcher::from_options(site_root, &options)),
//!     registry,
//!     Arc::new(features.module_catalog(&options)),
//! )?
//! .build()
//! .await;
//! ```

pub mod coordinator;
pub mod features;
pub mod fragment;
pub mod logging;
pub mod modules;
pub mod options;
pub mod page;
pub mod pipeline;
pub mod prefs;
pub mod registry;

pub use coordinator::{InitReport, InitStep, InitializationCoordinator};
pub use features::StandardFeatures;
pub use fragment::{
    Container, DirFragmentFetcher, FragmentContent, FragmentFetcher, FragmentName,
    HttpFragmentFetcher, LoadOutcome, LoadReport, SequentialLoader,
};
pub use logging::init_logging;
pub use modules::{DeferredModuleLoader, FeatureModule, ModuleCatalog, ModuleRef, ModuleSource};
pub use options::{DeferredFeature, LoggingOptions, SiteOptions};
pub use page::{Page, PageBuilder, PageReport, PipelineState};
pub use prefs::{JsonFilePreferences, MemoryPreferences, PreferenceStore};
pub use registry::{Initializer, InitializerRegistry, InitializerRole, PageView};

pub use folio_shared::{FailureKind, FolioError, FolioResult};
