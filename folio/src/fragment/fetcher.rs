//! Fragment retrieval.

use super::{FragmentContent, FragmentName, LoadOutcome};
use crate::options::SiteOptions;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Retrieves fragment content by name.
///
/// A single attempt per call; every failure path resolves to
/// [`LoadOutcome::Failed`]. Retry policy belongs to the caller.
#[async_trait]
pub trait FragmentFetcher: Send + Sync {
    async fn fetch(&self, name: &FragmentName) -> LoadOutcome;
}

/// Reads fragments from `<root>/<sections_dir>/<name>.<extension>`.
#[derive(Debug, Clone)]
pub struct DirFragmentFetcher {
    root: PathBuf,
    sections_dir: String,
    extension: String,
}

impl DirFragmentFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = SiteOptions::default();
        Self {
            root: root.into(),
            sections_dir: defaults.sections_dir,
            extension: defaults.extension,
        }
    }

    pub fn from_options(root: impl Into<PathBuf>, options: &SiteOptions) -> Self {
        Self {
            root: root.into(),
            sections_dir: options.sections_dir.clone(),
            extension: options.extension.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &FragmentName) -> PathBuf {
        self.root
            .join(&self.sections_dir)
            .join(format!("{}.{}", name, self.extension))
    }
}

#[async_trait]
impl FragmentFetcher for DirFragmentFetcher {
    async fn fetch(&self, name: &FragmentName) -> LoadOutcome {
        let path = self.path_for(name);
        tracing::debug!(fragment = %name, path = %path.display(), "Reading fragment");

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => LoadOutcome::Loaded(FragmentContent::new(content)),
            Err(e) => LoadOutcome::failed(name, format!("{}: {}", path.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_existing_fragment() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("sections")).unwrap();
        std::fs::write(dir.path().join("sections/header.html"), "<header></header>").unwrap();

        let fetcher = DirFragmentFetcher::new(dir.path());
        let name = FragmentName::new("header").unwrap();

        match fetcher.fetch(&name).await {
            LoadOutcome::Loaded(content) => assert_eq!(content.as_str(), "<header></header>"),
            LoadOutcome::Failed(e) => panic!("unexpected failure: {}", e),
        }
    }

    #[tokio::test]
    async fn test_missing_fragment_fails_with_name() {
        let dir = TempDir::new().unwrap();
        let fetcher = DirFragmentFetcher::new(dir.path());
        let name = FragmentName::new("hero").unwrap();

        match fetcher.fetch(&name).await {
            LoadOutcome::Failed(e) => assert!(e.to_string().contains("'hero'")),
            LoadOutcome::Loaded(_) => panic!("missing file must not load"),
        }
    }

    #[tokio::test]
    async fn test_custom_extension_and_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("parts")).unwrap();
        std::fs::write(dir.path().join("parts/footer.htm"), "<footer></footer>").unwrap();

        let options = SiteOptions {
            sections_dir: "parts".into(),
            extension: "htm".into(),
            ..Default::default()
        };
        let fetcher = DirFragmentFetcher::from_options(dir.path(), &options);
        let name = FragmentName::new("footer").unwrap();

        assert!(matches!(fetcher.fetch(&name).await, LoadOutcome::Loaded(_)));
    }
}
