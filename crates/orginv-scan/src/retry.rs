//! Retry policy with exponential backoff and jitter

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScanFailure;

/// Backoff policy applied around provider calls
///
/// Only retryable failure kinds (throttling, timeouts) are retried; anything
/// else fails the call immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt
    pub base_delay: Duration,
    /// Upper bound on the exponential delay
    pub max_delay: Duration,
    /// Uniform random jitter added on top of each delay
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Delay to sleep before retry number `attempt` (0-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
            .min(self.max_delay);

        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return exp;
        }

        exp + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

/// Run `op`, retrying retryable failures per `policy`
///
/// Returns the last failure once retries are exhausted, so a persistent
/// throttle surfaces with kind `throttled`.
///
/// # Errors
/// Returns the failure from the final attempt.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, ScanFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScanFailure>>,
{
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(failure) if failure.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                debug!(
                    attempt = attempt + 1,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    kind = %failure.kind,
                    "retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(failure) => return Err(failure),
        }
    }
}
