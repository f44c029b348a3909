//! Error types for host lookups

use thiserror::Error;

/// Result type for host-facing operations
pub type HostResult<T> = std::result::Result<T, HostError>;

/// Errors reported by a repository host.
///
/// `NotFound` is expected and drives control flow: a missing branch means
/// "try the next candidate", a missing run history means "no builds yet".
/// Every other variant is fatal to the reconciliation call that saw it and
/// propagates unchanged.
#[derive(Error, Debug)]
pub enum HostError {
    /// The requested branch, workflow, or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The host answered with a non-success status code.
    #[error("host returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never completed (connect failure, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The host answered with a body that could not be decoded.
    #[error("invalid host payload: {0}")]
    Payload(String),
}

impl HostError {
    /// True for the not-found outcome that callers treat as data rather
    /// than as a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }
}
