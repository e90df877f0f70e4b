//! S3 bucket scanner (global resource type)

use std::collections::BTreeMap;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use tracing::debug;

use orginv_auth::Credentials;

use crate::aws::{classify_sdk_error, sdk_credentials, to_utc};
use crate::error::ScanFailure;
use crate::record::{GLOBAL_REGION, ResourceRecord};
use crate::scanner::Scanner;

/// Scanner for S3 buckets, scanned once per account
pub struct S3BucketScanner;

fn client(creds: &Credentials, region: &str) -> Client {
    let conf = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(sdk_credentials(creds))
        .build();
    Client::from_conf(conf)
}

impl S3BucketScanner {
    /// Region the bucket actually lives in; an empty location constraint
    /// means us-east-1.
    async fn bucket_region(client: &Client, bucket: &str) -> Option<String> {
        match client.get_bucket_location().bucket(bucket).send().await {
            Ok(resp) => {
                let constraint = resp
                    .location_constraint()
                    .map(|c| c.as_str())
                    .unwrap_or_default();
                if constraint.is_empty() {
                    Some("us-east-1".to_string())
                } else {
                    Some(constraint.to_string())
                }
            }
            Err(e) => {
                debug!(bucket = %bucket, error = %DisplayErrorContext(&e), "failed to get bucket location");
                None
            }
        }
    }

    async fn bucket_versioning(client: &Client, bucket: &str) -> Option<String> {
        match client.get_bucket_versioning().bucket(bucket).send().await {
            Ok(resp) => Some(
                resp.status()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "Disabled".to_string()),
            ),
            Err(e) => {
                debug!(bucket = %bucket, error = %DisplayErrorContext(&e), "failed to get bucket versioning");
                None
            }
        }
    }

    /// Tag lookup is best effort; untagged buckets answer with an error.
    async fn bucket_tags(client: &Client, bucket: &str) -> BTreeMap<String, String> {
        match client.get_bucket_tagging().bucket(bucket).send().await {
            Ok(resp) => resp
                .tag_set()
                .iter()
                .map(|t| (t.key().to_string(), t.value().to_string()))
                .collect(),
            Err(e) => {
                debug!(bucket = %bucket, error = %DisplayErrorContext(&e), "no bucket tags");
                BTreeMap::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl Scanner for S3BucketScanner {
    fn resource_type(&self) -> &'static str {
        "s3-buckets"
    }

    fn is_global(&self) -> bool {
        true
    }

    async fn scan(
        &self,
        credentials: &Credentials,
        account_id: &str,
        account_name: &str,
        region: &str,
    ) -> Result<Vec<ResourceRecord>, ScanFailure> {
        let client = client(credentials, region);
        let mut records = Vec::new();

        let resp = client
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify_sdk_error("ListBuckets", &e))?;

        for bucket in resp.buckets() {
            let Some(name) = bucket.name() else { continue };

            let record = ResourceRecord::new(
                self.resource_type(),
                account_id,
                account_name,
                GLOBAL_REGION,
            )
            .field("bucket_name", name)
            .field("arn", format!("arn:aws:s3:::{name}"))
            .field_opt("created", bucket.creation_date().and_then(to_utc))
            .field_opt("bucket_region", Self::bucket_region(&client, name).await)
            .field_opt("versioning", Self::bucket_versioning(&client, name).await)
            .with_tags(Self::bucket_tags(&client, name).await);

            records.push(record);
        }

        debug!(
            account = %account_id,
            count = records.len(),
            "scanned s3 buckets"
        );

        Ok(records)
    }
}
