//! Persisted user preferences.
//!
//! Two string preferences are shared between features: `language` and
//! `theme`. Readers fall back to fixed defaults when a key is absent; writers
//! persist on every user-driven change.

use folio_shared::errors::{FolioError, FolioResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LANGUAGE_KEY: &str = "language";
pub const THEME_KEY: &str = "theme";

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_THEME: &str = "dark";

/// Key/value preference storage.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> FolioResult<()>;
}

/// Process-local preferences, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> FolioResult<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences stored as a flat JSON object on disk.
///
/// Every `set` rewrites the file through a temporary file in the same
/// directory, so a crash never leaves a truncated file behind.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFilePreferences {
    /// Open the preference file, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> FolioResult<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                FolioError::Storage(format!("corrupt preferences {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = values.len(), "Opened preferences");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> FolioResult<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, values)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| {
            FolioError::Storage(format!(
                "failed to write preferences {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> FolioResult<()> {
        let mut values = self.values.lock();
        let previous = values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&values) {
            match previous {
                Some(old) => values.insert(key.to_string(), old),
                None => values.remove(key),
            };
            return Err(e);
        }
        tracing::debug!(key, value, "Saved preference");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_roundtrip() {
        let prefs = MemoryPreferences::new();
        assert!(prefs.get(THEME_KEY).is_none());
        prefs.set(THEME_KEY, "light").unwrap();
        assert_eq!(prefs.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_json_file_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state/prefs.json");

        let prefs = JsonFilePreferences::open(&path).unwrap();
        assert!(prefs.get(LANGUAGE_KEY).is_none());
        prefs.set(LANGUAGE_KEY, "es").unwrap();
        prefs.set(THEME_KEY, "light").unwrap();

        let reopened = JsonFilePreferences::open(&path).unwrap();
        assert_eq!(reopened.get(LANGUAGE_KEY).as_deref(), Some("es"));
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFilePreferences::open(&path).unwrap_err();
        assert!(matches!(err, FolioError::Storage(_)));
    }
}
