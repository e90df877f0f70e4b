//! Scan units and matrix expansion

use orginv_auth::Account;
use orginv_scan::{GLOBAL_REGION, ScannerRegistry};

/// The atomic work item: one (account, region, scanner) combination
///
/// Global-scope scanners carry [`GLOBAL_REGION`] and get exactly one unit per
/// account regardless of the configured region count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanUnit {
    /// Target account id
    pub account_id: String,
    /// Target account name
    pub account_name: String,
    /// Target region, or [`GLOBAL_REGION`]
    pub region: String,
    /// Resource-type identifier of the scanner to run
    pub scanner_id: &'static str,
}

impl ScanUnit {
    /// Human-readable label for progress reporting
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}/{}", self.scanner_id, self.account_id, self.region)
    }
}

/// Expand accounts x regions x scanners into scan units
///
/// Global-scope scanners are collapsed to one unit per account at expansion
/// time, so the aggregator never needs dedup logic.
#[must_use]
pub fn expand_units(
    accounts: &[Account],
    regions: &[String],
    registry: &ScannerRegistry,
) -> Vec<ScanUnit> {
    let mut units = Vec::new();

    for account in accounts {
        for scanner in registry.iter() {
            if scanner.is_global() {
                units.push(ScanUnit {
                    account_id: account.id.clone(),
                    account_name: account.name.clone(),
                    region: GLOBAL_REGION.to_string(),
                    scanner_id: scanner.resource_type(),
                });
            } else {
                for region in regions {
                    units.push(ScanUnit {
                        account_id: account.id.clone(),
                        account_name: account.name.clone(),
                        region: region.clone(),
                        scanner_id: scanner.resource_type(),
                    });
                }
            }
        }
    }

    units
}
