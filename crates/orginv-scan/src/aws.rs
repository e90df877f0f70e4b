//! Shared helpers for AWS SDK-backed scanners

use std::collections::BTreeMap;

use aws_credential_types::Credentials as SdkCredentials;
// Smithy types are shared across all service crates; import them through one.
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::primitives::DateTime as SmithyDateTime;
use chrono::{DateTime, Utc};

use orginv_auth::Credentials;

use crate::error::{ErrorKind, ScanFailure};

/// Convert brokered credentials into the SDK's credential type
#[must_use]
pub fn sdk_credentials(creds: &Credentials) -> SdkCredentials {
    SdkCredentials::from_keys(
        creds.access_key_id.clone(),
        creds.secret_access_key.clone(),
        Some(creds.session_token.clone()),
    )
}

/// Convert a smithy timestamp into a chrono timestamp
#[must_use]
pub fn to_utc(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

/// Collect `(key, value)` tag pairs into a tag map, skipping keyless entries
pub fn tag_map<'a, I>(tags: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
{
    tags.into_iter()
        .filter_map(|(key, value)| {
            key.map(|k| (k.to_string(), value.unwrap_or_default().to_string()))
        })
        .collect()
}

/// Classify an SDK error into a [`ScanFailure`]
///
/// Throttling and access-denial are recognized by error code; transport-level
/// timeouts and undecodable responses by the error variant.
pub fn classify_sdk_error<E, R>(operation: &str, err: &SdkError<E, R>) -> ScanFailure
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let kind = match err {
        SdkError::TimeoutError(_) => ErrorKind::Timeout,
        SdkError::ResponseError(_) => ErrorKind::MalformedResponse,
        _ => match err.code() {
            Some(
                "Throttling" | "ThrottlingException" | "RequestLimitExceeded"
                | "TooManyRequestsException" | "SlowDown",
            ) => ErrorKind::Throttled,
            Some(
                "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation"
                | "UnauthorizedAccess" | "AuthFailure",
            ) => ErrorKind::AccessDenied,
            _ => ErrorKind::Other,
        },
    };

    ScanFailure::new(kind, format!("{operation}: {}", DisplayErrorContext(err)))
}
