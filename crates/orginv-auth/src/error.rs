//! Error types for orginv-auth

use thiserror::Error;

/// Errors that can occur while resolving accounts or credentials
#[derive(Error, Debug, Clone)]
pub enum AuthError {
    /// Role assumption was denied for the target account
    #[error("access denied assuming role in account {account}: {message}")]
    AccessDenied {
        /// Target account id
        account: String,
        /// Provider error message
        message: String,
    },

    /// Role assumption failed for a reason other than access denial
    #[error("failed to assume role in account {account}: {message}")]
    AssumeRole {
        /// Target account id
        account: String,
        /// Provider error message
        message: String,
    },

    /// Listing accounts from the organization directory failed
    #[error("organization directory error: {0}")]
    Directory(String),

    /// The provider returned a response missing required fields
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// No base credentials were available for the calling identity
    #[error("no base credentials: {0}")]
    NoCredentials(String),
}

impl AuthError {
    /// Check if the error is an access denial (as opposed to a transport
    /// or configuration problem)
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, AuthError::AccessDenied { .. })
    }
}
