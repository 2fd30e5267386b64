//! Sync Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A sync-engine error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Fetching the remote listing (marker or a page) failed. Aborts the
    /// current platform only; committed pages stay valid and a re-run
    /// re-ingests idempotently.
    #[display("remote listing sync failed")]
    Listing,
    /// Fetching the milestone feed failed. The store is left untouched.
    #[display("milestone feed sync failed")]
    Feed,
    #[display("store operation failed")]
    Store,
    #[display("could not serialize export document")]
    Serialize,
    /// The export file (or its temporary sibling) could not be written.
    /// The previous export, if any, remains in place.
    #[display("could not write export to {}", _0.display())]
    ExportIo(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Listing | Self::Feed)
    }
}
