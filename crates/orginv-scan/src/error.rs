//! Scan failure classification

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of failure a scan unit can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Provider throttled the calls and retries were exhausted
    Throttled,
    /// The assumed role lacks permission for the call
    AccessDenied,
    /// The provider call timed out
    Timeout,
    /// The provider returned a response that could not be interpreted
    MalformedResponse,
    /// Credentials could not be obtained for the unit
    Auth,
    /// Any other provider-side failure
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Throttled => "throttled",
            ErrorKind::AccessDenied => "access-denied",
            ErrorKind::Timeout => "timeout",
            ErrorKind::MalformedResponse => "malformed-response",
            ErrorKind::Auth => "auth",
            ErrorKind::Other => "other",
        };
        f.write_str(label)
    }
}

/// Failure of a single scan call
///
/// Never propagates past the worker that ran the unit; the scheduler converts
/// it into a `ScanError` entry on the aggregate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ScanFailure {
    /// Failure classification
    pub kind: ErrorKind,
    /// Provider error message
    pub message: String,
}

impl ScanFailure {
    /// Create a failure of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a throttling failure
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Throttled, message)
    }

    /// Shorthand for an access-denied failure
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AccessDenied, message)
    }

    /// Check if the failure is transient and worth retrying
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::Throttled | ErrorKind::Timeout)
    }
}
