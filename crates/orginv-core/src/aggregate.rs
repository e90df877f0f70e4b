//! Result aggregation

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use orginv_scan::{ErrorKind, ResourceRecord, ScanFailure, ScannerRegistry};

use crate::unit::ScanUnit;

/// Failure of one scan unit, recorded on the aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    /// Target account id
    pub account_id: String,
    /// Target account name
    pub account_name: String,
    /// Target region, or `"global"`
    pub region: String,
    /// Resource-type identifier of the failed scanner
    pub scanner_id: String,
    /// Failure classification
    pub kind: ErrorKind,
    /// Provider error message
    pub message: String,
}

impl ScanError {
    /// Build a scan error for a unit from its failure
    #[must_use]
    pub fn for_unit(unit: &ScanUnit, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            account_id: unit.account_id.clone(),
            account_name: unit.account_name.clone(),
            region: unit.region.clone(),
            scanner_id: unit.scanner_id.to_string(),
            kind,
            message: message.into(),
        }
    }

    /// Build a scan error from a classified scan failure
    #[must_use]
    pub fn from_failure(unit: &ScanUnit, failure: &ScanFailure) -> Self {
        Self::for_unit(unit, failure.kind, failure.message.clone())
    }
}

/// Metadata about one scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    /// When the scan started
    pub started_at: DateTime<Utc>,
    /// When the scan finished
    pub finished_at: DateTime<Utc>,
    /// Number of accounts scanned
    pub accounts_scanned: usize,
    /// Number of regions configured for regional scanners
    pub regions_scanned: usize,
}

/// The complete result of one scan run
///
/// Resource-type keys are exactly the registered scanners that produced at
/// least one record. Handed off immutably to the reporting layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAggregate {
    /// Records grouped by resource-type identifier
    pub resources: BTreeMap<String, Vec<ResourceRecord>>,
    /// Every per-unit failure of the run
    pub errors: Vec<ScanError>,
    /// Run metadata
    pub metadata: ScanMetadata,
}

impl InventoryAggregate {
    /// Total number of records across all resource types
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.resources.values().map(Vec::len).sum()
    }

    /// Records for one resource type, if any were found
    #[must_use]
    pub fn records_for(&self, resource_type: &str) -> &[ResourceRecord] {
        self.resources
            .get(resource_type)
            .map_or(&[], Vec::as_slice)
    }
}

/// Thread-safe collector for concurrent workers
///
/// One bucket per registered resource type; the bucket map itself is
/// immutable after construction, so workers only contend on the bucket of
/// the type they are appending to (plus the shared error list).
pub struct Aggregator {
    buckets: HashMap<&'static str, Mutex<Vec<ResourceRecord>>>,
    errors: Mutex<Vec<ScanError>>,
    started_at: DateTime<Utc>,
}

impl Aggregator {
    /// Create an aggregator with a bucket per registered scanner
    #[must_use]
    pub fn new(registry: &ScannerRegistry) -> Self {
        let buckets = registry
            .iter()
            .map(|s| (s.resource_type(), Mutex::new(Vec::new())))
            .collect();

        Self {
            buckets,
            errors: Mutex::new(Vec::new()),
            started_at: Utc::now(),
        }
    }

    /// Append records for one resource type
    pub fn record(&self, resource_type: &str, mut records: Vec<ResourceRecord>) {
        if records.is_empty() {
            return;
        }

        match self.buckets.get(resource_type) {
            Some(bucket) => bucket
                .lock()
                .expect("bucket lock poisoned")
                .append(&mut records),
            None => {
                warn!(resource_type = %resource_type, "dropping records for unregistered type");
            }
        }
    }

    /// Append one scan error
    pub fn record_error(&self, error: ScanError) {
        self.errors.lock().expect("error lock poisoned").push(error);
    }

    /// Number of errors recorded so far
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.lock().expect("error lock poisoned").len()
    }

    /// Drain everything into the final aggregate
    ///
    /// Called once after the scheduler reports completion; empty buckets are
    /// dropped so the aggregate's keys are exactly the producing scanners.
    #[must_use]
    pub fn finalize(&self, accounts_scanned: usize, regions_scanned: usize) -> InventoryAggregate {
        let resources = self
            .buckets
            .iter()
            .filter_map(|(id, bucket)| {
                let records = std::mem::take(&mut *bucket.lock().expect("bucket lock poisoned"));
                (!records.is_empty()).then(|| ((*id).to_string(), records))
            })
            .collect();

        let errors = std::mem::take(&mut *self.errors.lock().expect("error lock poisoned"));

        InventoryAggregate {
            resources,
            errors,
            metadata: ScanMetadata {
                started_at: self.started_at,
                finished_at: Utc::now(),
                accounts_scanned,
                regions_scanned,
            },
        }
    }
}
