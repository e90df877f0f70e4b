//! Scanner contract

use orginv_auth::Credentials;

use crate::error::ScanFailure;
use crate::record::ResourceRecord;

/// A resource-type scanner
///
/// Implementations are stateless and safe to invoke concurrently across scan
/// units. Credentials are passed per invocation and must not be retained.
#[async_trait::async_trait]
pub trait Scanner: Send + Sync {
    /// Stable resource-type identifier, used as the aggregate key
    fn resource_type(&self) -> &'static str;

    /// Whether the resource type has no per-region identity and is scanned
    /// once per account
    fn is_global(&self) -> bool {
        false
    }

    /// List every resource of this type visible in the account/region,
    /// paginating exhaustively
    ///
    /// For global scanners `region` is the API endpoint region; emitted
    /// records carry [`crate::record::GLOBAL_REGION`] instead.
    ///
    /// # Errors
    /// Returns a classified [`ScanFailure`]; the caller converts it into a
    /// scan error without affecting sibling units.
    async fn scan(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> Result<Vec<ResourceRecord>, ScanFailure>;
}
