//! Organization directory: account listing

use aws_config::BehaviorVersion;
use aws_sdk_organizations::Client;
use aws_sdk_organizations::error::DisplayErrorContext;
use aws_sdk_organizations::types::AccountStatus as SdkAccountStatus;
use tracing::info;

use crate::error::AuthError;
use crate::types::{Account, AccountStatus};

/// Source of the organization's account list
#[async_trait::async_trait]
pub trait OrgDirectory: Send + Sync {
    /// List every member account of the organization
    ///
    /// # Errors
    /// Returns [`AuthError::Directory`] when the listing call fails; this is
    /// fatal to the whole run.
    async fn list_accounts(&self) -> Result<Vec<Account>, AuthError>;
}

/// AWS Organizations-backed directory
pub struct OrganizationsDirectory {
    client: Client,
}

impl OrganizationsDirectory {
    /// Create a directory from an existing Organizations client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a directory from environment-sourced base credentials
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait::async_trait]
impl OrgDirectory for OrganizationsDirectory {
    async fn list_accounts(&self) -> Result<Vec<Account>, AuthError> {
        let mut accounts = Vec::new();

        let mut pages = self.client.list_accounts().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page
                .map_err(|e| AuthError::Directory(format!("{}", DisplayErrorContext(&e))))?;

            for acct in page.accounts() {
                let Some(id) = acct.id() else { continue };
                let status = match acct.status() {
                    Some(SdkAccountStatus::Active) => AccountStatus::Active,
                    _ => AccountStatus::Suspended,
                };

                accounts.push(Account {
                    id: id.to_string(),
                    name: acct.name().unwrap_or(id).to_string(),
                    status,
                });
            }
        }

        info!(count = accounts.len(), "listed organization accounts");

        Ok(accounts)
    }
}
