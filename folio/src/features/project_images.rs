//! Static project image galleries, loaded as a deferred module.

use crate::modules::FeatureModule;
use crate::registry::{Initializer, InitializerRegistry, InitializerRole, PageView};
use async_trait::async_trait;
use folio_shared::errors::FolioResult;
use parking_lot::RwLock;
use std::sync::Arc;

pub const GALLERY_CLASS: &str = "project-images";
pub const IMAGE_CLASS: &str = "project-image";

/// One `.project-images` container and the images it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery {
    pub images: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ProjectImagesFeature {
    galleries: RwLock<Vec<Gallery>>,
}

impl ProjectImagesFeature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn galleries(&self) -> Vec<Gallery> {
        self.galleries.read().clone()
    }
}

#[async_trait]
impl Initializer for ProjectImagesFeature {
    async fn init(&self, page: &PageView) -> FolioResult<()> {
        let galleries: Vec<Gallery> = page
            .container()
            .scoped(GALLERY_CLASS)
            .into_iter()
            .map(|(_, scope)| Gallery {
                images: scope
                    .iter()
                    .filter(|tag| tag.has_class(IMAGE_CLASS))
                    .map(|tag| tag.attr("src").unwrap_or_default().to_string())
                    .collect(),
            })
            .collect();

        for (index, gallery) in galleries.iter().enumerate() {
            if gallery.images.is_empty() {
                tracing::debug!(gallery = index, "No images in gallery");
            } else {
                tracing::debug!(gallery = index, images = gallery.images.len(), "Gallery ready");
            }
        }

        *self.galleries.write() = galleries;
        Ok(())
    }
}

/// Module entry for `js/modules/project-images.js`.
pub struct ProjectImagesModule {
    feature: Arc<ProjectImagesFeature>,
}

impl ProjectImagesModule {
    pub fn new(feature: Arc<ProjectImagesFeature>) -> Self {
        Self { feature }
    }
}

impl FeatureModule for ProjectImagesModule {
    fn install(&self, registry: &InitializerRegistry) -> FolioResult<()> {
        registry.register(InitializerRole::ProjectImages, self.feature.clone());
        Ok(())
    }
}
