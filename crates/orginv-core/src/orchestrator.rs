//! Top-level scan driver

use std::sync::Arc;

use tracing::{info, instrument};

use orginv_auth::{CredentialBroker, OrgDirectory, OrganizationsDirectory, StsRoleAssumer};
use orginv_scan::ScannerRegistry;

use crate::aggregate::{Aggregator, InventoryAggregate};
use crate::config::ScanConfig;
use crate::error::CoreError;
use crate::scheduler::{CancelFlag, ProgressFn, Scheduler};
use crate::unit::expand_units;

/// Drives one scan run end to end
///
/// Owns the coordination objects (broker, registry) and threads them through
/// to the scheduler and workers; nothing here is ambient or global.
pub struct Orchestrator {
    directory: Arc<dyn OrgDirectory>,
    broker: Arc<CredentialBroker>,
    registry: Arc<ScannerRegistry>,
    progress: Option<ProgressFn>,
    cancel: CancelFlag,
}

impl Orchestrator {
    /// Create an orchestrator from explicit collaborators
    pub fn new(
        directory: Arc<dyn OrgDirectory>,
        broker: Arc<CredentialBroker>,
        registry: Arc<ScannerRegistry>,
    ) -> Self {
        Self {
            directory,
            broker,
            registry,
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Create an orchestrator wired to AWS with environment-sourced base
    /// credentials and the built-in scanner table
    pub async fn from_env(config: &ScanConfig) -> Self {
        let directory = Arc::new(OrganizationsDirectory::from_env().await);
        let assumer = Arc::new(StsRoleAssumer::from_env(config.role_name.clone()).await);
        let broker =
            Arc::new(CredentialBroker::new(assumer).with_margin(config.credential_margin));

        Self::new(directory, broker, Arc::new(ScannerRegistry::builtin()))
    }

    /// Set a progress callback, forwarded to the scheduler
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set a cancellation handle, forwarded to the scheduler
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run a full scan and return the aggregate
    ///
    /// # Errors
    /// Fails fast on invalid configuration or when account discovery itself
    /// fails; every downstream failure stays unit-local and lands on the
    /// aggregate's error list instead.
    #[instrument(skip(self, config))]
    pub async fn run(&self, config: &ScanConfig) -> Result<InventoryAggregate, CoreError> {
        config.validate()?;

        let all_accounts = self.directory.list_accounts().await?;

        let accounts: Vec<_> = all_accounts
            .iter()
            .filter(|a| a.is_active())
            .filter(|a| config.is_account_allowed(&a.id))
            .cloned()
            .collect();

        info!(
            total = all_accounts.len(),
            scanned = accounts.len(),
            excluded = all_accounts.len() - accounts.len(),
            "resolved organization accounts"
        );

        if accounts.is_empty() {
            return Err(CoreError::Config(
                "no accounts left to scan after filtering".to_string(),
            ));
        }

        let units = expand_units(&accounts, &config.target_regions, &self.registry);
        let aggregator = Arc::new(Aggregator::new(&self.registry));

        let mut scheduler = Scheduler::new(config.worker_count)
            .with_retry(config.retry.clone())
            .with_cancel(self.cancel.clone());
        if let Some(progress) = self.progress.clone() {
            scheduler = scheduler.with_progress(progress);
        }

        // Global-scope units call the provider through the first configured
        // region; validate() guarantees it exists.
        let api_region = config.target_regions[0].clone();

        scheduler
            .run(
                units,
                self.broker.clone(),
                self.registry.clone(),
                aggregator.clone(),
                api_region,
            )
            .await;

        let aggregate = aggregator.finalize(accounts.len(), config.target_regions.len());

        info!(
            records = aggregate.total_records(),
            errors = aggregate.errors.len(),
            "scan run complete"
        );

        Ok(aggregate)
    }
}
