//! Credential broker with a single-flight per-account cache

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::TimeDelta;
use tracing::{debug, info};

use crate::error::AuthError;
use crate::types::Credentials;

/// Default validity margin below which cached credentials are refreshed
const DEFAULT_MARGIN: TimeDelta = TimeDelta::minutes(5);

/// Source of fresh per-account credentials
///
/// Production uses [`crate::sts::StsRoleAssumer`]; tests inject counting or
/// failing implementations.
#[async_trait::async_trait]
pub trait RoleAssumer: Send + Sync {
    /// Assume the configured role in the target account
    async fn assume_role(&self, account_id: &str) -> Result<Credentials, AuthError>;
}

/// Per-account credential slot
///
/// The `tokio` mutex is held across a refresh, so concurrent callers for the
/// same account queue behind the in-flight refresh and reuse its result.
type Slot = Arc<tokio::sync::Mutex<Option<Credentials>>>;

/// Expiry-aware credential cache keyed by account id
///
/// Constructed once by the orchestrator and shared by reference with every
/// worker. At most one refresh per account is in flight at any time.
pub struct CredentialBroker {
    assumer: Arc<dyn RoleAssumer>,
    slots: Mutex<HashMap<String, Slot>>,
    margin: TimeDelta,
}

impl CredentialBroker {
    /// Create a broker with the default 5 minute refresh margin
    pub fn new(assumer: Arc<dyn RoleAssumer>) -> Self {
        Self {
            assumer,
            slots: Mutex::new(HashMap::new()),
            margin: DEFAULT_MARGIN,
        }
    }

    /// Set the validity margin below which a cached entry is refreshed
    #[must_use]
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = TimeDelta::from_std(margin).unwrap_or(DEFAULT_MARGIN);
        self
    }

    /// Obtain credentials for the account, reusing the cached entry while it
    /// has more than the configured margin of validity left
    ///
    /// # Errors
    /// Returns the underlying [`AuthError`] when role assumption fails. The
    /// failure is not cached; the next caller retries the refresh.
    pub async fn obtain(&self, account_id: &str) -> Result<Credentials, AuthError> {
        let slot = {
            let mut slots = self.slots.lock().expect("slot map poisoned");
            slots.entry(account_id.to_string()).or_default().clone()
        };

        let mut guard = slot.lock().await;

        if let Some(creds) = guard.as_ref()
            && creds.is_fresh(self.margin)
        {
            debug!(account = %account_id, "reusing cached credentials");
            return Ok(creds.clone());
        }

        info!(account = %account_id, "assuming role");
        let fresh = self.assumer.assume_role(account_id).await?;
        *guard = Some(fresh.clone());

        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::Utc;

    use super::*;

    struct CountingAssumer {
        calls: AtomicU32,
        ttl: TimeDelta,
    }

    impl CountingAssumer {
        fn new(ttl: TimeDelta) -> Self {
            Self {
                calls: AtomicU32::new(0),
                ttl,
            }
        }
    }

    #[async_trait::async_trait]
    impl RoleAssumer for CountingAssumer {
        async fn assume_role(&self, account_id: &str) -> Result<Credentials, AuthError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            // Simulate a slow STS round trip so concurrent callers overlap.
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(Credentials {
                access_key_id: format!("AKIA-{account_id}-{call}"),
                secret_access_key: "secret".to_string(),
                session_token: "token".to_string(),
                expires_at: Utc::now() + self.ttl,
            })
        }
    }

    struct DenyingAssumer;

    #[async_trait::async_trait]
    impl RoleAssumer for DenyingAssumer {
        async fn assume_role(&self, account_id: &str) -> Result<Credentials, AuthError> {
            Err(AuthError::AccessDenied {
                account: account_id.to_string(),
                message: "not authorized".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let assumer = Arc::new(CountingAssumer::new(TimeDelta::hours(1)));
        let broker = Arc::new(CredentialBroker::new(assumer.clone()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let broker = broker.clone();
            handles.push(tokio::spawn(
                async move { broker.obtain("111111111111").await },
            ));
        }

        let mut keys = Vec::new();
        for handle in handles {
            let creds = handle.await.unwrap().unwrap();
            keys.push(creds.access_key_id);
        }

        assert_eq!(assumer.calls.load(Ordering::SeqCst), 1);
        assert!(keys.iter().all(|k| k == &keys[0]));
    }

    #[tokio::test]
    async fn distinct_accounts_refresh_independently() {
        let assumer = Arc::new(CountingAssumer::new(TimeDelta::hours(1)));
        let broker = CredentialBroker::new(assumer.clone());

        broker.obtain("111111111111").await.unwrap();
        broker.obtain("222222222222").await.unwrap();

        assert_eq!(assumer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn entry_inside_margin_is_refreshed() {
        // Credentials expire in 1 minute, margin is 5 minutes: every obtain
        // must trigger a refresh.
        let assumer = Arc::new(CountingAssumer::new(TimeDelta::minutes(1)));
        let broker = CredentialBroker::new(assumer.clone());

        broker.obtain("111111111111").await.unwrap();
        broker.obtain("111111111111").await.unwrap();

        assert_eq!(assumer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fresh_entry_is_reused() {
        let assumer = Arc::new(CountingAssumer::new(TimeDelta::hours(1)));
        let broker = CredentialBroker::new(assumer.clone());

        broker.obtain("111111111111").await.unwrap();
        broker.obtain("111111111111").await.unwrap();

        assert_eq!(assumer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_typed_and_not_cached() {
        let broker = CredentialBroker::new(Arc::new(DenyingAssumer));

        let err = broker.obtain("333333333333").await.unwrap_err();
        assert!(err.is_access_denied());

        // A second attempt goes back to the assumer rather than reusing a
        // poisoned slot.
        let err = broker.obtain("333333333333").await.unwrap_err();
        assert!(err.is_access_denied());
    }
}
