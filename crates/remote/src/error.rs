//! Remote Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A remote-fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The request failed in transit or the server answered with an error
    /// status. Transient by nature; the whole run can simply be re-invoked.
    #[display("http request failed")]
    Http,
    /// The server answered 2xx but the body was not what we expected.
    #[display("malformed remote response: {_0}")]
    MalformedResponse(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http)
    }
}
