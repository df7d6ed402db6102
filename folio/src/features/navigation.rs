//! Section navigation: scroll spy, anchor scrolling, header state.
//!
//! Layout is supplied by the caller as [`SectionBounds`]; this module only
//! decides which section is active and where to scroll.

use crate::fragment::Container;
use crate::registry::{Initializer, PageView};
use async_trait::async_trait;
use folio_shared::errors::FolioResult;
use parking_lot::RwLock;

/// Distance above a section's top at which it becomes active.
pub const SCROLL_SPY_OFFSET: f64 = 100.0;
/// Height of the fixed header, subtracted from anchor scroll targets.
pub const HEADER_OFFSET: f64 = 80.0;
/// Scroll position past which the header is styled as scrolled.
pub const HEADER_SCROLLED_THRESHOLD: f64 = 50.0;
/// Section considered active when the URL has no fragment.
pub const DEFAULT_SECTION: &str = "home";

const NAV_LINK_CLASS: &str = "nav-link";

/// Vertical placement of one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBounds {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl SectionBounds {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }
}

/// Last section whose top, less the spy offset, is at or above `scroll_y`.
pub fn active_section(scroll_y: f64, bounds: &[SectionBounds]) -> Option<&str> {
    bounds
        .iter()
        .rfind(|section| scroll_y >= section.top - SCROLL_SPY_OFFSET)
        .map(|section| section.id.as_str())
}

pub fn header_scrolled(scroll_y: f64) -> bool {
    scroll_y > HEADER_SCROLLED_THRESHOLD
}

#[derive(Debug, Default)]
struct NavState {
    sections: Vec<String>,
    links: Vec<String>,
    current: String,
}

#[derive(Debug, Default)]
pub struct Navigation {
    state: RwLock<NavState>,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of `<section>` elements in document order.
    pub fn sections(&self) -> Vec<String> {
        self.state.read().sections.clone()
    }

    pub fn current(&self) -> String {
        self.state.read().current.clone()
    }

    /// `href` of the nav link pointing at `section`, if any.
    pub fn link_for(&self, section: &str) -> Option<String> {
        let target = format!("#{}", section);
        self.state
            .read()
            .links
            .iter()
            .find(|href| **href == target)
            .cloned()
    }

    /// Section to activate on load for a URL fragment (with or without `#`).
    pub fn initial_section(hash: Option<&str>) -> String {
        hash.map(|h| h.trim_start_matches('#'))
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_SECTION)
            .to_string()
    }

    /// Recompute the active section; returns it only when it changed.
    pub fn update_active(&self, scroll_y: f64, bounds: &[SectionBounds]) -> Option<String> {
        let active = active_section(scroll_y, bounds)?;
        let mut state = self.state.write();
        if state.current == active {
            return None;
        }
        state.current = active.to_string();
        Some(state.current.clone())
    }

    /// Scroll position for jumping to `target`, which becomes current.
    pub fn scroll_target(&self, target: &str, bounds: &[SectionBounds]) -> Option<f64> {
        let section = bounds.iter().find(|section| section.id == target)?;
        self.state.write().current = section.id.clone();
        Some((section.top - HEADER_OFFSET).max(0.0))
    }

    fn index(&self, container: &Container, hash: Option<&str>) -> usize {
        let sections: Vec<String> = container
            .elements_by_tag("section")
            .into_iter()
            .filter_map(|tag| tag.id().map(str::to_string))
            .collect();
        let links = container
            .elements_with_class(NAV_LINK_CLASS)
            .into_iter()
            .filter_map(|tag| tag.attr("href").map(str::to_string))
            .collect();

        let count = sections.len();
        *self.state.write() = NavState {
            sections,
            links,
            current: Self::initial_section(hash),
        };
        count
    }
}

#[async_trait]
impl Initializer for Navigation {
    async fn init(&self, page: &PageView) -> FolioResult<()> {
        let sections = self.index(page.container(), None);
        if sections == 0 {
            tracing::warn!("No sections found for navigation");
        } else {
            tracing::debug!(sections, current = %self.current(), "Navigation ready");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::container_from;
    use std::sync::Arc;

    fn layout() -> Vec<SectionBounds> {
        vec![
            SectionBounds::new("home", 0.0, 600.0),
            SectionBounds::new("about", 600.0, 800.0),
            SectionBounds::new("projects", 1400.0, 900.0),
        ]
    }

    #[test]
    fn test_active_section_uses_spy_offset() {
        let bounds = layout();
        assert_eq!(active_section(0.0, &bounds), Some("home"));
        assert_eq!(active_section(499.0, &bounds), Some("home"));
        assert_eq!(active_section(500.0, &bounds), Some("about"));
        assert_eq!(active_section(5000.0, &bounds), Some("projects"));
        assert_eq!(active_section(0.0, &[]), None);
    }

    #[test]
    fn test_update_active_reports_changes_only() {
        let nav = Navigation::new();
        let bounds = layout();
        assert_eq!(nav.update_active(10.0, &bounds).as_deref(), Some("home"));
        assert_eq!(nav.update_active(20.0, &bounds), None);
        assert_eq!(nav.update_active(1300.0, &bounds).as_deref(), Some("projects"));
    }

    #[test]
    fn test_scroll_target_subtracts_header() {
        let nav = Navigation::new();
        assert_eq!(nav.scroll_target("about", &layout()), Some(520.0));
        assert_eq!(nav.current(), "about");
        assert_eq!(nav.scroll_target("home", &layout()), Some(0.0));
        assert_eq!(nav.scroll_target("missing", &layout()), None);
        assert_eq!(nav.current(), "home");
    }

    #[test]
    fn test_header_threshold_and_initial_section() {
        assert!(!header_scrolled(50.0));
        assert!(header_scrolled(50.5));
        assert_eq!(Navigation::initial_section(None), "home");
        assert_eq!(Navigation::initial_section(Some("#")), "home");
        assert_eq!(Navigation::initial_section(Some("#contact")), "contact");
    }

    #[tokio::test]
    async fn test_init_indexes_sections_and_links() {
        let container = container_from(&[
            (
                "header",
                "<nav><a class=\"nav-link\" href=\"#home\">Home</a><a class=\"nav-link\" href=\"#about\">About</a></nav>",
            ),
            ("hero", "<section id=\"home\"></section>"),
            ("about", "<section id=\"about\"></section>"),
        ]);
        let nav = Navigation::new();

        nav.init(&PageView::new(Arc::new(container))).await.unwrap();

        assert_eq!(nav.sections(), vec!["home", "about"]);
        assert_eq!(nav.current(), "home");
        assert_eq!(nav.link_for("about").as_deref(), Some("#about"));
        assert!(nav.link_for("contact").is_none());
    }
}
