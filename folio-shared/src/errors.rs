//! Error types for the folio page pipeline.
//!
//! Most failures in the pipeline are absorbed and recorded rather than
//! propagated. `FailureKind` is the classification used when a failure is
//! recorded in a report instead of being returned.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used across folio crates.
pub type FolioResult<T> = Result<T, FolioError>;

#[derive(Debug, Error)]
pub enum FolioError {
    /// A fragment could not be retrieved (network, storage, or status).
    #[error("failed to fetch fragment '{fragment}': {reason}")]
    Fetch { fragment: String, reason: String },

    /// A deferred feature module failed to load.
    #[error("failed to load module '{module}': {reason}")]
    ModuleLoad { module: String, reason: String },

    /// An initializer reported an error or panicked.
    #[error("initializer '{role}' failed: {reason}")]
    Initializer { role: String, reason: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Category of a recorded (non-propagated) failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Fetch,
    ModuleLoad,
    Initializer,
    Timeout,
    Other,
}

impl FolioError {
    /// Classify this error for failure reports.
    pub fn kind(&self) -> FailureKind {
        match self {
            FolioError::Fetch { .. } => FailureKind::Fetch,
            FolioError::ModuleLoad { .. } => FailureKind::ModuleLoad,
            FolioError::Initializer { .. } => FailureKind::Initializer,
            FolioError::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        let err = FolioError::Fetch {
            fragment: "hero".into(),
            reason: "404 Not Found".into(),
        };
        assert_eq!(err.kind(), FailureKind::Fetch);
        assert!(err.to_string().contains("hero"));

        let err = FolioError::Config("empty fragment list".into());
        assert_eq!(err.kind(), FailureKind::Other);
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: FolioError = io.into();
        assert!(matches!(err, FolioError::Io(_)));
        assert_eq!(err.kind(), FailureKind::Other);
    }
}
