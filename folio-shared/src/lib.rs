//! Types shared between the folio crates.

pub mod errors;

pub use errors::{FailureKind, FolioError, FolioResult};
