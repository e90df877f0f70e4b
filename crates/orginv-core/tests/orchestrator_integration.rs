use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};

use orginv_auth::{
    Account, AccountStatus, AuthError, CredentialBroker, Credentials, OrgDirectory, RoleAssumer,
};
use orginv_scan::{
    GLOBAL_REGION, ResourceRecord, RetryPolicy, ScanFailure, Scanner, ScannerRegistry,
};
use orginv_core::{CancelFlag, CoreError, InventoryAggregate, Orchestrator, ScanConfig};

// Mock implementations

struct MockDirectory {
    accounts: Vec<Account>,
}

#[async_trait]
impl OrgDirectory for MockDirectory {
    async fn list_accounts(&self) -> Result<Vec<Account>, AuthError> {
        Ok(self.accounts.clone())
    }
}

struct FailingDirectory;

#[async_trait]
impl OrgDirectory for FailingDirectory {
    async fn list_accounts(&self) -> Result<Vec<Account>, AuthError> {
        Err(AuthError::Directory("organizations unreachable".to_string()))
    }
}

#[derive(Default)]
struct CountingAssumer {
    calls: AtomicU32,
}

#[async_trait]
impl RoleAssumer for CountingAssumer {
    async fn assume_role(&self, account_id: &str) -> Result<Credentials, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Credentials {
            access_key_id: format!("AKIA-{account_id}"),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        })
    }
}

/// Emits a fixed number of records per unit, with optional artificial delay.
struct FixedScanner {
    id: &'static str,
    global: bool,
    per_unit: usize,
    max_delay_ms: u64,
}

impl FixedScanner {
    fn regional(id: &'static str, per_unit: usize) -> Arc<dyn Scanner> {
        Arc::new(Self {
            id,
            global: false,
            per_unit,
            max_delay_ms: 0,
        })
    }

    fn global(id: &'static str, per_unit: usize) -> Arc<dyn Scanner> {
        Arc::new(Self {
            id,
            global: true,
            per_unit,
            max_delay_ms: 0,
        })
    }
}

#[async_trait]
impl Scanner for FixedScanner {
    fn resource_type(&self) -> &'static str {
        self.id
    }

    fn is_global(&self) -> bool {
        self.global
    }

    async fn scan(
        &self,
        _credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> Result<Vec<ResourceRecord>, ScanFailure> {
        if self.max_delay_ms > 0 {
            let delay = {
                use rand::Rng;
                rand::rng().random_range(0..=self.max_delay_ms)
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let record_region = if self.global { GLOBAL_REGION } else { region };

        Ok((0..self.per_unit)
            .map(|idx| {
                ResourceRecord::new(self.id, account_id, account_name, record_region)
                    .field("idx", i64::try_from(idx).unwrap())
            })
            .collect())
    }
}

/// Always throttled, even after retries.
struct ThrottlingScanner {
    id: &'static str,
}

#[async_trait]
impl Scanner for ThrottlingScanner {
    fn resource_type(&self) -> &'static str {
        self.id
    }

    async fn scan(
        &self,
        _credentials: &Credentials,
        _account_id: &str,
        _account_name: &str,
        _region: &str,
    ) -> Result<Vec<ResourceRecord>, ScanFailure> {
        Err(ScanFailure::throttled("rate exceeded"))
    }
}

/// Lists two resources; tag enrichment "fails" for the second, leaving its
/// tag map empty without failing the unit.
struct PartialTagScanner;

#[async_trait]
impl Scanner for PartialTagScanner {
    fn resource_type(&self) -> &'static str {
        "tagged-things"
    }

    async fn scan(
        &self,
        _credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> Result<Vec<ResourceRecord>, ScanFailure> {
        let mut tags = std::collections::BTreeMap::new();
        tags.insert("Name".to_string(), "first".to_string());

        Ok(vec![
            ResourceRecord::new("tagged-things", account_id, account_name, region)
                .field("id", "thing-1")
                .with_tags(tags),
            ResourceRecord::new("tagged-things", account_id, account_name, region)
                .field("id", "thing-2"),
        ])
    }
}

// Helpers

fn accounts(ids: &[(&str, &str)]) -> Vec<Account> {
    ids.iter().map(|(id, name)| Account::new(*id, *name)).collect()
}

fn orchestrator(accounts: Vec<Account>, scanners: Vec<Arc<dyn Scanner>>) -> Orchestrator {
    Orchestrator::new(
        Arc::new(MockDirectory { accounts }),
        Arc::new(CredentialBroker::new(Arc::new(CountingAssumer::default()))),
        Arc::new(ScannerRegistry::new(scanners)),
    )
}

fn config(regions: &[&str], workers: usize) -> ScanConfig {
    ScanConfig {
        target_regions: regions.iter().map(ToString::to_string).collect(),
        worker_count: workers,
        retry: RetryPolicy {
            max_retries: 2,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        },
        ..ScanConfig::default()
    }
}

/// Order-independent view of an aggregate's records.
fn record_set(aggregate: &InventoryAggregate) -> Vec<String> {
    let mut entries: Vec<String> = aggregate
        .resources
        .values()
        .flatten()
        .map(|r| serde_json::to_string(r).unwrap())
        .collect();
    entries.sort();
    entries
}

// Tests

#[tokio::test]
async fn global_scanners_run_once_per_account() {
    let orch = orchestrator(
        accounts(&[("111111111111", "prod"), ("222222222222", "staging")]),
        vec![
            FixedScanner::regional("widgets", 1),
            FixedScanner::global("globals", 1),
        ],
    );

    let aggregate = orch
        .run(&config(&["us-east-1", "us-west-2", "eu-west-1"], 4))
        .await
        .unwrap();

    let globals = aggregate.records_for("globals");
    assert_eq!(globals.len(), 2);
    assert!(globals.iter().all(|r| r.region == GLOBAL_REGION));

    let global_accounts: HashSet<_> = globals.iter().map(|r| r.account_id.as_str()).collect();
    assert_eq!(global_accounts.len(), 2);

    // Regional scanner still covers the full matrix.
    assert_eq!(aggregate.records_for("widgets").len(), 2 * 3);
}

#[tokio::test]
async fn blacklisted_account_is_never_dispatched() {
    let labels: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen = labels.clone();

    let mut cfg = config(&["us-east-1"], 4);
    cfg.account_blacklist.insert("111111111111".to_string());

    let orch = orchestrator(
        accounts(&[("111111111111", "prod"), ("222222222222", "staging")]),
        vec![FixedScanner::regional("widgets", 1)],
    )
    .with_progress(Arc::new(move |label, _, _| {
        seen.lock().unwrap().push(label.to_string());
    }));

    let aggregate = orch.run(&cfg).await.unwrap();

    let labels = labels.lock().unwrap();
    assert!(!labels.is_empty());
    assert!(labels.iter().all(|l| !l.contains("111111111111")));
    assert!(
        aggregate
            .records_for("widgets")
            .iter()
            .all(|r| r.account_id == "222222222222")
    );
}

#[tokio::test]
async fn suspended_accounts_are_skipped() {
    let mut accts = accounts(&[("111111111111", "prod")]);
    accts.push(Account {
        id: "333333333333".to_string(),
        name: "closed".to_string(),
        status: AccountStatus::Suspended,
    });

    let orch = orchestrator(accts, vec![FixedScanner::regional("widgets", 1)]);
    let aggregate = orch.run(&config(&["us-east-1"], 2)).await.unwrap();

    assert!(
        aggregate
            .records_for("widgets")
            .iter()
            .all(|r| r.account_id == "111111111111")
    );
    assert_eq!(aggregate.metadata.accounts_scanned, 1);
}

#[tokio::test]
async fn persistent_throttle_yields_exactly_one_error() {
    let orch = orchestrator(
        accounts(&[("111111111111", "prod")]),
        vec![
            FixedScanner::regional("widgets", 1),
            Arc::new(ThrottlingScanner { id: "flaky" }),
        ],
    );

    let aggregate = orch.run(&config(&["us-east-1"], 2)).await.unwrap();

    assert_eq!(aggregate.errors.len(), 1);
    let error = &aggregate.errors[0];
    assert_eq!(error.kind, orginv_scan::ErrorKind::Throttled);
    assert_eq!(error.scanner_id, "flaky");
    assert_eq!(error.account_id, "111111111111");

    // No partial records from the failed unit, siblings unaffected.
    assert!(aggregate.records_for("flaky").is_empty());
    assert_eq!(aggregate.records_for("widgets").len(), 1);
}

#[tokio::test]
async fn bounded_pool_loses_and_duplicates_nothing() {
    // 50 accounts x 5 regions x 2 scanners = 500 units on 8 workers.
    let accts: Vec<Account> = (0..50)
        .map(|i| Account::new(format!("{i:012}"), format!("account-{i}")))
        .collect();

    let scanners: Vec<Arc<dyn Scanner>> = vec![
        Arc::new(FixedScanner {
            id: "widgets",
            global: false,
            per_unit: 2,
            max_delay_ms: 3,
        }),
        Arc::new(FixedScanner {
            id: "gadgets",
            global: false,
            per_unit: 2,
            max_delay_ms: 3,
        }),
    ];

    let orch = orchestrator(accts, scanners);
    let aggregate = orch
        .run(&config(
            &["r1", "r2", "r3", "r4", "r5"],
            8,
        ))
        .await
        .unwrap();

    assert!(aggregate.errors.is_empty());
    assert_eq!(aggregate.total_records(), 500 * 2);
    assert_eq!(aggregate.records_for("widgets").len(), 500);
    assert_eq!(aggregate.records_for("gadgets").len(), 500);

    // Exact-once: every (account, region, idx) coordinate appears once.
    let coords: HashSet<String> = aggregate
        .records_for("widgets")
        .iter()
        .map(|r| format!("{}/{}/{:?}", r.account_id, r.region, r.fields.get("idx")))
        .collect();
    assert_eq!(coords.len(), 500);
}

#[tokio::test]
async fn repeated_runs_yield_identical_record_sets() {
    let accts = accounts(&[("111111111111", "prod"), ("222222222222", "staging")]);
    let scanners = || {
        vec![
            Arc::new(FixedScanner {
                id: "widgets",
                global: false,
                per_unit: 3,
                max_delay_ms: 2,
            }) as Arc<dyn Scanner>,
            FixedScanner::global("globals", 2),
        ]
    };
    let cfg = config(&["us-east-1", "us-west-2"], 3);

    let first = orchestrator(accts.clone(), scanners()).run(&cfg).await.unwrap();
    let second = orchestrator(accts, scanners()).run(&cfg).await.unwrap();

    assert_eq!(record_set(&first), record_set(&second));
}

#[tokio::test]
async fn credentials_are_brokered_once_per_account() {
    let assumer = Arc::new(CountingAssumer::default());
    let orch = Orchestrator::new(
        Arc::new(MockDirectory {
            accounts: accounts(&[("111111111111", "prod"), ("222222222222", "staging")]),
        }),
        Arc::new(CredentialBroker::new(assumer.clone())),
        Arc::new(ScannerRegistry::new(vec![
            FixedScanner::regional("widgets", 1),
            FixedScanner::regional("gadgets", 1),
        ])),
    );

    // 2 accounts x 5 regions x 2 scanners = 20 units, but only 2 refreshes.
    orch.run(&config(&["r1", "r2", "r3", "r4", "r5"], 8))
        .await
        .unwrap();

    assert_eq!(assumer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn zero_success_run_still_returns_aggregate() {
    let orch = orchestrator(
        accounts(&[("111111111111", "prod")]),
        vec![Arc::new(ThrottlingScanner { id: "flaky" })],
    );

    let aggregate = orch
        .run(&config(&["us-east-1", "us-west-2"], 2))
        .await
        .unwrap();

    assert!(aggregate.resources.is_empty());
    assert_eq!(aggregate.errors.len(), 2);
    assert_eq!(aggregate.metadata.accounts_scanned, 1);
}

#[tokio::test]
async fn partial_tag_failure_keeps_the_record() {
    let orch = orchestrator(
        accounts(&[("111111111111", "prod")]),
        vec![Arc::new(PartialTagScanner)],
    );

    let aggregate = orch.run(&config(&["us-east-1"], 1)).await.unwrap();

    assert!(aggregate.errors.is_empty());
    let records = aggregate.records_for("tagged-things");
    assert_eq!(records.len(), 2);

    let untagged = records
        .iter()
        .find(|r| r.fields.get("id") == Some(&orginv_scan::FieldValue::Str("thing-2".into())))
        .unwrap();
    assert!(untagged.tags.is_empty());
}

#[tokio::test]
async fn cancellation_skips_pending_units() {
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();

    let orch = orchestrator(
        accounts(&[("111111111111", "prod")]),
        vec![FixedScanner::regional("widgets", 1)],
    )
    .with_cancel(cancel)
    .with_progress(Arc::new(move |_, _, _| trigger.cancel()));

    // 10 regions on a single worker; cancellation fires after the first
    // completed unit, so most units are never dispatched.
    let aggregate = orch
        .run(&config(
            &["r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10"],
            1,
        ))
        .await
        .unwrap();

    let count = aggregate.records_for("widgets").len();
    assert!(count >= 1);
    assert!(count < 10);
    assert!(aggregate.errors.is_empty());
}

#[tokio::test]
async fn directory_failure_is_fatal() {
    let orch = Orchestrator::new(
        Arc::new(FailingDirectory),
        Arc::new(CredentialBroker::new(Arc::new(CountingAssumer::default()))),
        Arc::new(ScannerRegistry::new(vec![FixedScanner::regional(
            "widgets", 1,
        )])),
    );

    let err = orch.run(&config(&["us-east-1"], 2)).await.unwrap_err();
    assert!(matches!(err, CoreError::Auth(_)));
}

#[tokio::test]
async fn filtering_away_every_account_is_a_config_error() {
    let mut cfg = config(&["us-east-1"], 2);
    cfg.account_blacklist.insert("111111111111".to_string());

    let orch = orchestrator(
        accounts(&[("111111111111", "prod")]),
        vec![FixedScanner::regional("widgets", 1)],
    );

    let err = orch.run(&cfg).await.unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
}
