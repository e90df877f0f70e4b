//! Worker pool scheduler for scan units

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use orginv_auth::CredentialBroker;
use orginv_scan::{ErrorKind, GLOBAL_REGION, RetryPolicy, ScannerRegistry, with_backoff};

use crate::aggregate::{Aggregator, ScanError};
use crate::unit::ScanUnit;

/// Progress callback: (unit label, completed count, total count)
///
/// Invoked from worker tasks after each unit completes; a blocking
/// implementation degrades throughput but not correctness.
pub type ProgressFn = Arc<dyn Fn(&str, usize, usize) + Send + Sync>;

/// Cooperative cancellation handle
///
/// Cancelling stops new units from being dispatched; in-flight units run to
/// completion, keeping the partial aggregate consistent.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an uncancelled flag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executes scan units with bounded parallelism
///
/// A semaphore caps in-flight units at the worker count, which in turn caps
/// simultaneous provider API calls.
pub struct Scheduler {
    worker_count: usize,
    retry: RetryPolicy,
    progress: Option<ProgressFn>,
    cancel: CancelFlag,
}

impl Scheduler {
    /// Create a scheduler with the given worker count
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count: worker_count.max(1),
            retry: RetryPolicy::default(),
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    /// Set the retry policy applied around scanner calls
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set a progress callback
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set the cancellation handle
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every unit to completion
    ///
    /// Returns only when every dispatched unit has reported an outcome to the
    /// aggregator. `global_api_region` is the endpoint region used for
    /// global-scope units.
    pub async fn run(
        &self,
        units: Vec<ScanUnit>,
        broker: Arc<CredentialBroker>,
        registry: Arc<ScannerRegistry>,
        aggregator: Arc<Aggregator>,
        global_api_region: String,
    ) {
        let total = units.len();
        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        info!(total, workers = self.worker_count, "dispatching scan units");

        for unit in units {
            if self.cancel.is_cancelled() {
                info!(
                    dispatched = completed.load(Ordering::SeqCst),
                    total, "cancelled, skipping remaining units"
                );
                break;
            }

            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };

            let broker = broker.clone();
            let registry = registry.clone();
            let aggregator = aggregator.clone();
            let retry = self.retry.clone();
            let progress = self.progress.clone();
            let completed = completed.clone();
            let api_region = global_api_region.clone();

            tasks.spawn(async move {
                let _permit = permit;

                execute_unit(&unit, &broker, &registry, &aggregator, &retry, &api_region).await;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(progress) = progress {
                    progress(&unit.label(), done, total);
                }
            });
        }

        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "scan task panicked");
            }
        }

        info!(
            completed = completed.load(Ordering::SeqCst),
            total,
            errors = aggregator.error_count(),
            "scan units finished"
        );
    }
}

/// Execute one unit: credentials, scan call, aggregation
///
/// Every failure path records exactly one scan error; nothing propagates
/// past this function.
async fn execute_unit(
    unit: &ScanUnit,
    broker: &CredentialBroker,
    registry: &ScannerRegistry,
    aggregator: &Aggregator,
    retry: &RetryPolicy,
    global_api_region: &str,
) {
    let Some(scanner) = registry.get(unit.scanner_id) else {
        aggregator.record_error(ScanError::for_unit(
            unit,
            ErrorKind::Other,
            format!("no scanner registered for {}", unit.scanner_id),
        ));
        return;
    };

    let credentials = match broker.obtain(&unit.account_id).await {
        Ok(creds) => creds,
        Err(e) => {
            let kind = if e.is_access_denied() {
                ErrorKind::AccessDenied
            } else {
                ErrorKind::Auth
            };
            warn!(unit = %unit.label(), error = %e, "credential resolution failed");
            aggregator.record_error(ScanError::for_unit(unit, kind, e.to_string()));
            return;
        }
    };

    let call_region = if unit.region == GLOBAL_REGION {
        global_api_region
    } else {
        unit.region.as_str()
    };

    let outcome = with_backoff(retry, || {
        scanner.scan(&credentials, &unit.account_id, &unit.account_name, call_region)
    })
    .await;

    match outcome {
        Ok(records) => {
            debug!(unit = %unit.label(), count = records.len(), "unit completed");
            aggregator.record(unit.scanner_id, records);
        }
        Err(failure) => {
            warn!(unit = %unit.label(), kind = %failure.kind, "unit failed");
            aggregator.record_error(ScanError::from_failure(unit, &failure));
        }
    }
}
