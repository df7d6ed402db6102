//! Built-in page features.
//!
//! Theme, i18n, navigation and modal are registered up front. Carousel and
//! project images ship as deferred modules: [`StandardFeatures::module_catalog`]
//! maps each configured module path to code that registers the initializer
//! when the module is loaded.

pub mod carousel;
pub mod i18n;
pub mod modal;
pub mod navigation;
pub mod project_images;
pub mod theme;

pub use carousel::{AssetLocator, CarouselFeature, CarouselModule, CarouselState, DirAssetLocator};
pub use i18n::{Catalog, I18n, LanguageButton, LanguageSection, Translation};
pub use modal::{ModalFeature, ModalImage};
pub use navigation::{Navigation, SectionBounds};
pub use project_images::{ProjectImagesFeature, ProjectImagesModule};
pub use theme::{Theme, ThemeController};

use crate::modules::{FeatureModule, ModuleCatalog};
use crate::options::SiteOptions;
use crate::prefs::PreferenceStore;
use crate::registry::{InitializerRegistry, InitializerRole};
use std::sync::Arc;

/// Handles to every built-in feature.
pub struct StandardFeatures {
    pub theme: Arc<ThemeController>,
    pub i18n: Arc<I18n>,
    pub navigation: Arc<Navigation>,
    pub carousel: Arc<CarouselFeature>,
    pub project_images: Arc<ProjectImagesFeature>,
    pub modal: Arc<ModalFeature>,
}

impl StandardFeatures {
    pub fn new(
        prefs: Arc<dyn PreferenceStore>,
        catalog: Catalog,
        assets: Arc<dyn AssetLocator>,
    ) -> Self {
        Self {
            theme: Arc::new(ThemeController::new(prefs.clone())),
            i18n: Arc::new(I18n::new(catalog, prefs)),
            navigation: Arc::new(Navigation::new()),
            carousel: CarouselFeature::new(assets),
            project_images: Arc::new(ProjectImagesFeature::new()),
            modal: Arc::new(ModalFeature::new()),
        }
    }

    /// Register the eagerly available initializers.
    pub fn register(&self, registry: &InitializerRegistry) {
        registry.register(InitializerRole::Theme, self.theme.clone());
        registry.register(InitializerRole::I18n, self.i18n.clone());
        registry.register(InitializerRole::Navigation, self.navigation.clone());
        registry.register(InitializerRole::Modal, self.modal.clone());
    }

    /// Catalog of the deferred modules, keyed by the configured paths.
    ///
    /// Features whose role has no built-in module are left out, so loading
    /// them fails as an unknown module.
    pub fn module_catalog(&self, options: &SiteOptions) -> ModuleCatalog {
        options
            .deferred_features
            .iter()
            .fold(ModuleCatalog::new(), |catalog, feature| {
                let code: Arc<dyn FeatureModule> = match feature.role {
                    InitializerRole::Carousel => {
                        Arc::new(CarouselModule::new(self.carousel.clone()))
                    }
                    InitializerRole::ProjectImages => {
                        Arc::new(ProjectImagesModule::new(self.project_images.clone()))
                    }
                    _ => return catalog,
                };
                catalog.with_module(feature.module.clone(), code)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::ModuleRef;
    use crate::prefs::MemoryPreferences;

    fn features() -> StandardFeatures {
        StandardFeatures::new(
            Arc::new(MemoryPreferences::new()),
            Catalog::default(),
            Arc::new(DirAssetLocator::new(".")),
        )
    }

    #[test]
    fn test_register_leaves_deferred_roles_empty() {
        let registry = InitializerRegistry::new();
        features().register(&registry);

        assert_eq!(
            registry.roles(),
            vec![
                InitializerRole::Theme,
                InitializerRole::I18n,
                InitializerRole::Navigation,
                InitializerRole::Modal,
            ]
        );
    }

    #[test]
    fn test_catalog_follows_configured_paths() {
        let catalog = features().module_catalog(&SiteOptions::default());
        assert!(catalog.contains(&ModuleRef::new("js/modules/carousel.js")));
        assert!(catalog.contains(&ModuleRef::new("js/modules/project-images.js")));
        assert!(!catalog.contains(&ModuleRef::new("js/modules/modal.js")));
    }
}
