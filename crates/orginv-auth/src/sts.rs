//! STS-backed role assumption

use aws_config::BehaviorVersion;
use aws_sdk_sts::Client;
use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::broker::RoleAssumer;
use crate::error::AuthError;
use crate::types::Credentials;

/// Session lifetime requested from STS (1 hour)
const SESSION_DURATION_SECS: i32 = 3600;

/// Assumes a fixed cross-account role via STS
///
/// The calling identity comes from the base credentials of the SDK config
/// (environment or an upstream federated identity).
pub struct StsRoleAssumer {
    client: Client,
    role_name: String,
}

impl StsRoleAssumer {
    /// Create an assumer from an existing STS client
    pub fn new(client: Client, role_name: impl Into<String>) -> Self {
        Self {
            client,
            role_name: role_name.into(),
        }
    }

    /// Create an assumer from environment-sourced base credentials
    pub async fn from_env(role_name: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(Client::new(&config), role_name)
    }
}

#[async_trait::async_trait]
impl RoleAssumer for StsRoleAssumer {
    async fn assume_role(&self, account_id: &str) -> Result<Credentials, AuthError> {
        let role_arn = format!("arn:aws:iam::{account_id}:role/{}", self.role_name);

        debug!(account = %account_id, role = %self.role_name, "calling sts:AssumeRole");

        let resp = self
            .client
            .assume_role()
            .role_arn(&role_arn)
            .role_session_name(format!("resource-inventory-{account_id}"))
            .duration_seconds(SESSION_DURATION_SECS)
            .send()
            .await
            .map_err(|e| classify_assume_error(&e, account_id))?;

        let creds = resp.credentials().ok_or_else(|| {
            AuthError::MalformedResponse("AssumeRole response missing credentials".to_string())
        })?;

        let expiration = creds.expiration();
        let expires_at = DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos())
            .unwrap_or_else(|| Utc::now() + TimeDelta::seconds(i64::from(SESSION_DURATION_SECS)));

        Ok(Credentials {
            access_key_id: creds.access_key_id().to_string(),
            secret_access_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().to_string(),
            expires_at,
        })
    }
}

fn classify_assume_error<E, R>(err: &SdkError<E, R>, account_id: &str) -> AuthError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{}", DisplayErrorContext(err));

    match err.code() {
        Some("AccessDenied" | "AccessDeniedException") => AuthError::AccessDenied {
            account: account_id.to_string(),
            message,
        },
        _ => AuthError::AssumeRole {
            account: account_id.to_string(),
            message,
        },
    }
}
