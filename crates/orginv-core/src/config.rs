//! Scan run configuration

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use orginv_scan::RetryPolicy;

use crate::error::CoreError;

/// Configuration for one scan run
///
/// Treated as an immutable input by the orchestrator; parsing it from files
/// or the environment is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Role assumed in each target account
    #[serde(default = "default_role_name")]
    pub role_name: String,
    /// Regions scanned for regional resource types
    #[serde(default = "default_regions")]
    pub target_regions: Vec<String>,
    /// Maximum number of concurrently executing scan units
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Account ids excluded from scanning (exact, case-sensitive match)
    #[serde(default)]
    pub account_blacklist: HashSet<String>,
    /// Directory the external renderer writes reports into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Backoff policy applied around provider calls
    #[serde(default)]
    pub retry: RetryPolicy,
    /// Validity margin below which cached credentials are refreshed
    #[serde(default = "default_credential_margin")]
    pub credential_margin: Duration,
}

fn default_role_name() -> String {
    "AWSControlTowerExecution".to_string()
}

fn default_regions() -> Vec<String> {
    vec!["us-east-1".to_string(), "us-west-2".to_string()]
}

fn default_worker_count() -> usize {
    20
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_credential_margin() -> Duration {
    Duration::from_secs(300)
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            role_name: default_role_name(),
            target_regions: default_regions(),
            worker_count: default_worker_count(),
            account_blacklist: HashSet::new(),
            output_dir: default_output_dir(),
            retry: RetryPolicy::default(),
            credential_margin: default_credential_margin(),
        }
    }
}

impl ScanConfig {
    /// Validate the configuration before scanning starts
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for an empty region list or a zero
    /// worker count.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.target_regions.is_empty() {
            return Err(CoreError::Config(
                "target_regions must not be empty".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(CoreError::Config(
                "worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if an account passes the blacklist
    #[must_use]
    pub fn is_account_allowed(&self, account_id: &str) -> bool {
        !self.account_blacklist.contains(account_id)
    }
}
