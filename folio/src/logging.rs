//! Process-wide tracing setup.

use crate::options::LoggingOptions;
use folio_shared::errors::{FolioError, FolioResult};
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive, e.g. `folio=debug`.
pub const LOG_ENV: &str = "FOLIO_LOG";

const LOG_FILE_PREFIX: &str = "folio.log";

// Keeps the file writer flushing for the life of the process.
static GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops.
///
/// Fails only if another subscriber was installed outside this function.
pub fn init_logging(options: &LoggingOptions) -> FolioResult<()> {
    if GUARD.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&options.level))
        .map_err(|e| FolioError::Config(format!("invalid log filter: {}", e)))?;

    let guard = match &options.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| FolioError::Internal(format!("logging already initialized: {}", e)))?;
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_ansi(options.ansi)
                .try_init()
                .map_err(|e| FolioError::Internal(format!("logging already initialized: {}", e)))?;
            None
        }
    };

    let _ = GUARD.set(guard);
    tracing::debug!(dir = ?options.log_dir, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoggingOptions {
            level: "debug".into(),
            log_dir: Some(dir.path().join("logs")),
            ansi: false,
        };

        init_logging(&options).unwrap();
        init_logging(&LoggingOptions::default()).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }
}
