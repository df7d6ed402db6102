//! Append-only page container.
//!
//! The container is written only by the sequential loader. Once loading has
//! finished it is frozen behind an `Arc` and initializers get read access.

use super::markup::{StartTag, scan_start_tags};
use super::{FragmentContent, FragmentName};
use std::ops::Range;
use std::sync::OnceLock;

/// A fragment that made it into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedFragment {
    pub name: FragmentName,
    /// Byte range of this fragment in [`Container::html`].
    pub range: Range<usize>,
}

#[derive(Debug, Default)]
pub struct Container {
    markup: String,
    fragments: Vec<InsertedFragment>,
    tags: OnceLock<Vec<StartTag>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment after everything inserted so far.
    pub(crate) fn append(&mut self, name: FragmentName, content: FragmentContent) {
        let start = self.markup.len();
        self.markup.push_str(content.as_str());
        let end = self.markup.len();

        tracing::trace!(fragment = %name, bytes = end - start, "Appended fragment");

        self.fragments.push(InsertedFragment {
            name,
            range: start..end,
        });
        self.tags = OnceLock::new();
    }

    /// Concatenated markup of every inserted fragment, in insertion order.
    pub fn html(&self) -> &str {
        &self.markup
    }

    pub fn fragments(&self) -> &[InsertedFragment] {
        &self.fragments
    }

    pub fn fragment_names(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn fragment_html(&self, name: &str) -> Option<&str> {
        self.fragments
            .iter()
            .find(|f| f.name.as_str() == name)
            .map(|f| &self.markup[f.range.clone()])
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Start tags of the whole document, scanned once and cached.
    pub fn tags(&self) -> &[StartTag] {
        self.tags.get_or_init(|| scan_start_tags(&self.markup))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.tags().iter().any(|tag| tag.has_class(class))
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.tags().iter().any(|tag| tag.id() == Some(id))
    }

    pub fn elements_with_class(&self, class: &str) -> Vec<&StartTag> {
        self.tags().iter().filter(|tag| tag.has_class(class)).collect()
    }

    pub fn elements_by_tag(&self, name: &str) -> Vec<&StartTag> {
        self.tags().iter().filter(|tag| tag.name == name).collect()
    }

    /// Elements carrying `class`, each with the tags that follow it.
    ///
    /// A scope ends at the next element with the same class or at the end of
    /// the fragment holding the element, whichever comes first.
    pub fn scoped(&self, class: &str) -> Vec<(&StartTag, &[StartTag])> {
        let tags = self.tags();
        let markers: Vec<usize> = tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| tag.has_class(class))
            .map(|(i, _)| i)
            .collect();

        markers
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let owner_end = self
                    .fragments
                    .iter()
                    .find(|f| f.range.contains(&tags[start].offset))
                    .map_or(self.markup.len(), |f| f.range.end);
                let limit = markers.get(n + 1).copied().unwrap_or(tags.len());
                let end = tags[start + 1..limit]
                    .iter()
                    .position(|tag| tag.offset >= owner_end)
                    .map_or(limit, |p| start + 1 + p);
                (&tags[start], &tags[start + 1..end])
            })
            .collect()
    }

    /// Distinct `data-i18n` keys in document order.
    pub fn i18n_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for key in self.tags().iter().filter_map(|tag| tag.data("i18n")) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

#[cfg(test)]
pub(crate) fn container_from(parts: &[(&str, &str)]) -> Container {
    let mut container = Container::new();
    for (name, html) in parts {
        container.append(
            FragmentName::new(*name).expect("valid test fragment name"),
            FragmentContent::new(*html),
        );
    }
    container
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_ranges() {
        let container = container_from(&[
            ("header", "<header id=\"top\"></header>"),
            ("about", "<section id=\"about\"></section>"),
        ]);

        assert_eq!(container.fragment_names(), vec!["header", "about"]);
        assert_eq!(
            container.html(),
            "<header id=\"top\"></header><section id=\"about\"></section>"
        );
        assert_eq!(
            container.fragment_html("about"),
            Some("<section id=\"about\"></section>")
        );
        assert!(container.fragment_html("hero").is_none());
    }

    #[test]
    fn test_tag_cache_invalidated_on_append() {
        let mut container = container_from(&[("a", "<div class=\"x\"></div>")]);
        assert!(!container.has_class("project-carousel"));

        container.append(
            FragmentName::new("b").unwrap(),
            FragmentContent::new("<div class=\"project-carousel\"></div>"),
        );
        assert!(container.has_class("project-carousel"));
        assert_eq!(container.elements_with_class("project-carousel").len(), 1);
    }

    #[test]
    fn test_i18n_keys_are_distinct() {
        let container = container_from(&[(
            "hero",
            r#"<h1 data-i18n="hero.title"></h1><p data-i18n="hero.description"></p><span data-i18n="hero.title"></span>"#,
        )]);
        assert_eq!(container.i18n_keys(), vec!["hero.title", "hero.description"]);
    }

    #[test]
    fn test_scoped_stops_at_next_marker_and_fragment_end() {
        let container = container_from(&[
            (
                "projects",
                r#"<div class="project-carousel" data-project="a"><div class="carousel-slide"></div><div class="carousel-slide"></div></div><div class="project-carousel" data-project="b"><div class="carousel-slide"></div></div>"#,
            ),
            ("contact", r#"<div class="carousel-slide"></div>"#),
        ]);

        let scopes = container.scoped("project-carousel");
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0].0.data("project"), Some("a"));
        assert_eq!(scopes[0].1.len(), 2);
        assert_eq!(scopes[1].0.data("project"), Some("b"));
        assert_eq!(scopes[1].1.len(), 1);
    }
}
