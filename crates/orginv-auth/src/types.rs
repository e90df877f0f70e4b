//! Account and credential types

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Membership status of an account within the organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account is active and scannable
    Active,
    /// Account is suspended or pending closure
    Suspended,
}

/// A member account of the organization
///
/// Immutable snapshot sourced from the organization directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier
    pub id: String,
    /// Human-readable account name
    pub name: String,
    /// Membership status at the time of listing
    pub status: AccountStatus,
}

impl Account {
    /// Create an active account
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: AccountStatus::Active,
        }
    }

    /// Check if the account can be scanned
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Temporary credentials for one target account
///
/// Owned by the broker's cache and handed to scanners by value per
/// invocation. Scanners must not retain them past the call.
#[derive(Clone)]
pub struct Credentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token
    pub session_token: String,
    /// When these credentials expire
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    /// Check whether the credentials are still usable with `margin` of
    /// validity left
    #[must_use]
    pub fn is_fresh(&self, margin: TimeDelta) -> bool {
        self.expires_at > Utc::now() + margin
    }
}

// Secret material stays out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "super-secret".to_string(),
            session_token: "session-token".to_string(),
            expires_at: Utc::now(),
        };

        let rendered = format!("{creds:?}");
        assert!(rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("session-token"));
    }

    #[test]
    fn freshness_respects_margin() {
        let creds = Credentials {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: String::new(),
            expires_at: Utc::now() + TimeDelta::minutes(3),
        };

        assert!(creds.is_fresh(TimeDelta::minutes(1)));
        assert!(!creds.is_fresh(TimeDelta::minutes(5)));
    }
}
