//! Core error types for orginv-core

use thiserror::Error;

use orginv_auth::AuthError;

/// Errors that abort a whole scan run
///
/// Per-unit failures never surface here; they land on the aggregate's error
/// list instead.
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Invalid configuration, detected before any scanning starts
    #[error("configuration error: {0}")]
    Config(String),

    /// Account discovery or base credential failure
    #[error(transparent)]
    Auth(#[from] AuthError),
}
