//! Page fragments: naming, retrieval, and ordered insertion.
//!
//! ```text
//! FragmentName ──→ FragmentFetcher ──→ LoadOutcome ──→ SequentialLoader ──→ Container
//!                  (dir / http)        Loaded|Failed    (one at a time)     (append-only)
//! ```

mod container;
mod fetcher;
mod http;
mod loader;
mod markup;

pub use container::{Container, InsertedFragment};
pub use fetcher::{DirFragmentFetcher, FragmentFetcher};
pub use http::HttpFragmentFetcher;
pub use loader::{FragmentLoadFailure, LoadReport, SequentialLoader};
pub use markup::StartTag;

#[cfg(test)]
pub(crate) use container::container_from;
#[cfg(test)]
pub(crate) use loader::testing;

use folio_shared::errors::{FolioError, FolioResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical name of a fragment, e.g. `header` for `sections/header.html`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FragmentName(String);

impl FragmentName {
    /// Validate and wrap a fragment name.
    ///
    /// Names are path components: non-empty, no separators, no `..`.
    pub fn new(name: impl Into<String>) -> FolioResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(FolioError::Config("fragment name must not be empty".into()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(FolioError::Config(format!(
                "fragment name '{}' must be a single path component",
                name
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FragmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FragmentName {
    type Error = FolioError;

    fn try_from(value: String) -> FolioResult<Self> {
        Self::new(value)
    }
}

impl From<FragmentName> for String {
    fn from(value: FragmentName) -> Self {
        value.0
    }
}

/// Raw markup returned by a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentContent(String);

impl FragmentContent {
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Result of a single fetch attempt. Fetchers never return `Err`.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(FragmentContent),
    Failed(FolioError),
}

impl LoadOutcome {
    pub(crate) fn failed(name: &FragmentName, reason: impl Into<String>) -> Self {
        LoadOutcome::Failed(FolioError::Fetch {
            fragment: name.to_string(),
            reason: reason.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_name_validation() {
        assert!(FragmentName::new("header").is_ok());
        assert!(FragmentName::new("").is_err());
        assert!(FragmentName::new("../secrets").is_err());
        assert!(FragmentName::new("a\\b").is_err());
        assert!(FragmentName::new("..").is_err());
    }

    #[test]
    fn test_fragment_name_deserialize_rejects_invalid() {
        let ok: FragmentName = serde_json::from_str("\"hero\"").unwrap();
        assert_eq!(ok.as_str(), "hero");
        assert!(serde_json::from_str::<FragmentName>("\"a/b\"").is_err());
    }
}
