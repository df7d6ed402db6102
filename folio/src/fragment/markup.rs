//! Flat start-tag scanner.
//!
//! Fragments are only inspected structurally (which classes, ids and data
//! attributes exist), so a linear scan over start tags is enough. Tags inside
//! comments are ignored.

use regex::Regex;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<([a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^\s=/>]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*/?>"#,
    )
    .expect("start tag pattern is valid")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s=/>]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

/// A start tag with its attributes, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in source order; names lowercased, valueless attributes map to "".
    pub attrs: Vec<(String, String)>,
    /// Byte offset of `<` in the scanned markup.
    pub offset: usize,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Value of a `data-*` attribute, e.g. `data("project")`.
    pub fn data(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name.strip_prefix("data-") == Some(key))
            .map(|(_, value)| value.as_str())
    }
}

pub(crate) fn scan_start_tags(markup: &str) -> Vec<StartTag> {
    let comments: Vec<(usize, usize)> = COMMENT_RE
        .find_iter(markup)
        .map(|m| (m.start(), m.end()))
        .collect();
    let in_comment = |offset: usize| comments.iter().any(|&(s, e)| offset >= s && offset < e);

    TAG_RE
        .captures_iter(markup)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if in_comment(whole.start()) {
                return None;
            }
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let attrs = caps
                .get(2)
                .map(|raw| parse_attrs(raw.as_str()))
                .unwrap_or_default();
            Some(StartTag {
                name,
                attrs,
                offset: whole.start(),
            })
        })
        .collect()
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_attributes() {
        let tags = scan_start_tags(
            r#"<div class="project-carousel wide" data-project='atlas'><img data-src=img/a.png alt="A"><br/></div>"#,
        );
        assert_eq!(tags.len(), 3);
        assert_eq!(tags[0].name, "div");
        assert!(tags[0].has_class("project-carousel"));
        assert!(tags[0].has_class("wide"));
        assert_eq!(tags[0].data("project"), Some("atlas"));
        assert_eq!(tags[1].data("src"), Some("img/a.png"));
        assert_eq!(tags[1].attr("alt"), Some("A"));
        assert_eq!(tags[2].name, "br");
    }

    #[test]
    fn test_valueless_attribute_and_case() {
        let tags = scan_start_tags(r#"<SECTION ID="about" hidden>"#);
        assert_eq!(tags[0].name, "section");
        assert_eq!(tags[0].id(), Some("about"));
        assert_eq!(tags[0].attr("hidden"), Some(""));
    }

    #[test]
    fn test_comments_and_closing_tags_ignored() {
        let tags = scan_start_tags("<!-- <div class=\"project-carousel\"> --></p><p>text</p>");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "p");
    }
}
