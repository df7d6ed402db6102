//! Site configuration.

use crate::fragment::FragmentName;
use crate::modules::ModuleRef;
use crate::registry::InitializerRole;
use folio_shared::errors::{FolioError, FolioResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fragments of the default portfolio layout, in load order.
pub const DEFAULT_FRAGMENTS: [&str; 7] = [
    "header", "hero", "about", "skills", "projects", "contact", "footer",
];

/// A feature whose module is loaded on demand.
///
/// The feature is considered present when the loaded page contains at least
/// one element carrying `marker_class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredFeature {
    pub role: InitializerRole,
    pub module: ModuleRef,
    pub marker_class: String,
}

impl DeferredFeature {
    pub fn new(role: InitializerRole, module: &str, marker_class: &str) -> Self {
        Self {
            role,
            module: ModuleRef::new(module),
            marker_class: marker_class.to_string(),
        }
    }
}

/// Page pipeline options.
///
/// Every field has a default, so a config file only needs the overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteOptions {
    /// Fragment load order. Order is significant; may be empty.
    pub fragments: Vec<FragmentName>,
    /// Directory (relative to the site root) holding fragments.
    pub sections_dir: String,
    /// Fragment file extension, without the dot.
    pub extension: String,
    /// Features loaded after the sync initializers, in declared order.
    pub deferred_features: Vec<DeferredFeature>,
    /// Run deferred features concurrently instead of one after another.
    pub parallel_features: bool,
    /// Per-module load timeout. `None` waits indefinitely.
    pub module_timeout_ms: Option<u64>,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            fragments: DEFAULT_FRAGMENTS
                .iter()
                .filter_map(|name| FragmentName::new(*name).ok())
                .collect(),
            sections_dir: "sections".to_string(),
            extension: "html".to_string(),
            deferred_features: vec![
                DeferredFeature::new(
                    InitializerRole::Carousel,
                    "js/modules/carousel.js",
                    "project-carousel",
                ),
                DeferredFeature::new(
                    InitializerRole::ProjectImages,
                    "js/modules/project-images.js",
                    "project-images",
                ),
            ],
            parallel_features: false,
            module_timeout_ms: None,
        }
    }
}

impl SiteOptions {
    /// Load options from a JSON file and validate them.
    pub fn from_json_file(path: &Path) -> FolioResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FolioError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let options: SiteOptions = serde_json::from_str(&raw)?;
        options.sanitize()?;
        Ok(options)
    }

    /// Validate option invariants.
    ///
    /// An empty fragment list is accepted; the page then has no content and
    /// only the always-planned initializers run.
    pub fn sanitize(&self) -> FolioResult<()> {
        let mut seen = HashSet::new();
        for name in &self.fragments {
            if !seen.insert(name.as_str()) {
                return Err(FolioError::Config(format!(
                    "fragment '{}' listed more than once",
                    name
                )));
            }
        }

        if self.sections_dir.is_empty() {
            return Err(FolioError::Config("sections_dir must not be empty".into()));
        }

        if self.extension.is_empty() || self.extension.contains(['.', '/', '\\']) {
            return Err(FolioError::Config(format!(
                "invalid fragment extension '{}'",
                self.extension
            )));
        }

        let mut roles = HashSet::new();
        for feature in &self.deferred_features {
            if !feature.role.is_deferred() {
                return Err(FolioError::Config(format!(
                    "{} cannot be loaded as a deferred feature",
                    feature.role
                )));
            }
            if !roles.insert(feature.role) {
                return Err(FolioError::Config(format!(
                    "deferred feature {} configured more than once",
                    feature.role
                )));
            }
            if feature.module.as_str().trim().is_empty() {
                return Err(FolioError::Config(format!(
                    "deferred feature {} has no module path",
                    feature.role
                )));
            }
            if feature.marker_class.trim().is_empty() {
                return Err(FolioError::Config(format!(
                    "deferred feature {} has no marker class",
                    feature.role
                )));
            }
        }

        if self.module_timeout_ms == Some(0) {
            return Err(FolioError::Config(
                "module_timeout_ms must be positive when set".into(),
            ));
        }

        Ok(())
    }

    pub fn module_timeout(&self) -> Option<Duration> {
        self.module_timeout_ms.map(Duration::from_millis)
    }
}

/// Logging options for [`crate::init_logging`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default filter directive when `FOLIO_LOG` is unset.
    pub level: String,
    /// Write logs to daily-rotated files in this directory instead of stderr.
    pub log_dir: Option<PathBuf>,
    pub ansi: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            ansi: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let options = SiteOptions::default();
        options.sanitize().unwrap();
        assert_eq!(options.fragments.len(), 7);
        assert_eq!(options.fragments[0].as_str(), "header");
        assert!(options.module_timeout().is_none());
    }

    #[test]
    fn test_duplicate_fragment_rejected() {
        let options = SiteOptions {
            fragments: vec![
                FragmentName::new("header").unwrap(),
                FragmentName::new("header").unwrap(),
            ],
            ..Default::default()
        };
        let err = options.sanitize().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_empty_fragment_list_accepted() {
        let options = SiteOptions {
            fragments: Vec::new(),
            ..Default::default()
        };
        options.sanitize().unwrap();
    }

    #[test]
    fn test_non_deferred_role_rejected() {
        let mut options = SiteOptions::default();
        options.deferred_features.push(DeferredFeature::new(
            InitializerRole::Modal,
            "js/modules/modal.js",
            "modal",
        ));
        assert!(options.sanitize().is_err());
    }

    #[test]
    fn test_bad_extension_rejected() {
        let options = SiteOptions {
            extension: ".html".into(),
            ..Default::default()
        };
        assert!(options.sanitize().is_err());
    }

    #[test]
    fn test_from_json_file_with_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(
            &path,
            r#"{ "fragments": ["header", "about"], "parallel_features": true, "module_timeout_ms": 250 }"#,
        )
        .unwrap();

        let options = SiteOptions::from_json_file(&path).unwrap();
        assert_eq!(options.fragments.len(), 2);
        assert_eq!(options.extension, "html");
        assert!(options.parallel_features);
        assert_eq!(options.module_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_from_json_file_rejects_invalid_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.json");
        std::fs::write(&path, r#"{ "fragments": ["../etc"] }"#).unwrap();

        assert!(SiteOptions::from_json_file(&path).is_err());
    }
}
