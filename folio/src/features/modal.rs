//! Full-size image viewer.

use crate::registry::{Initializer, PageView};
use async_trait::async_trait;
use folio_shared::errors::FolioResult;
use parking_lot::RwLock;

pub const MODAL_ID: &str = "imageModal";
/// Clickable wrapper around each project image.
pub const IMAGE_CONTAINER_CLASS: &str = "project-image-container";

/// Image currently shown in the modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalImage {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Default)]
struct ModalState {
    present: bool,
    clickable: usize,
    showing: Option<ModalImage>,
}

#[derive(Debug, Default)]
pub struct ModalFeature {
    state: RwLock<ModalState>,
}

impl ModalFeature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the page has a modal element to drive.
    pub fn is_present(&self) -> bool {
        self.state.read().present
    }

    pub fn clickable_images(&self) -> usize {
        self.state.read().clickable
    }

    pub fn is_open(&self) -> bool {
        self.state.read().showing.is_some()
    }

    pub fn current(&self) -> Option<ModalImage> {
        self.state.read().showing.clone()
    }

    /// Show an image. Does nothing when the page has no modal.
    pub fn open(&self, src: &str, alt: &str) -> bool {
        let mut state = self.state.write();
        if !state.present {
            return false;
        }
        state.showing = Some(ModalImage {
            src: src.to_string(),
            alt: alt.to_string(),
        });
        true
    }

    /// Hide the modal; returns whether it was open.
    pub fn close(&self) -> bool {
        self.state.write().showing.take().is_some()
    }

    pub fn handle_escape(&self) -> bool {
        self.close()
    }

    /// Click anywhere; only a click on the backdrop itself closes.
    pub fn handle_click_outside(&self, on_backdrop: bool) -> bool {
        on_backdrop && self.close()
    }
}

#[async_trait]
impl Initializer for ModalFeature {
    async fn init(&self, page: &PageView) -> FolioResult<()> {
        let container = page.container();
        let mut state = self.state.write();
        state.present = container.has_id(MODAL_ID);
        state.showing = None;
        if !state.present {
            state.clickable = 0;
            tracing::debug!("No image modal in page");
            return Ok(());
        }
        state.clickable = container.elements_with_class(IMAGE_CONTAINER_CLASS).len();
        tracing::debug!(images = state.clickable, "Image modal ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::container_from;
    use std::sync::Arc;

    async fn initialized(html: &str) -> ModalFeature {
        let modal = ModalFeature::new();
        let view = PageView::new(Arc::new(container_from(&[("projects", html)])));
        modal.init(&view).await.unwrap();
        modal
    }

    #[tokio::test]
    async fn test_absent_modal_is_inert() {
        let modal = initialized(r#"<div class="project-image-container"></div>"#).await;
        assert!(!modal.is_present());
        assert_eq!(modal.clickable_images(), 0);
        assert!(!modal.open("a.png", "A"));
        assert!(!modal.is_open());
    }

    #[tokio::test]
    async fn test_open_and_close_paths() {
        let modal = initialized(
            r#"<div class="project-image-container"></div><div class="project-image-container"></div><div id="imageModal"></div>"#,
        )
        .await;
        assert_eq!(modal.clickable_images(), 2);

        assert!(modal.open("a.png", "Shop"));
        assert_eq!(
            modal.current(),
            Some(ModalImage {
                src: "a.png".into(),
                alt: "Shop".into()
            })
        );
        assert!(!modal.handle_click_outside(false));
        assert!(modal.is_open());
        assert!(modal.handle_click_outside(true));
        assert!(!modal.is_open());

        modal.open("b.png", "");
        assert!(modal.handle_escape());
        assert!(!modal.handle_escape());
    }
}
