//! RDS instance scanner

use aws_sdk_rds::Client;
use aws_sdk_rds::config::{BehaviorVersion, Region};
use tracing::debug;

use orginv_auth::Credentials;

use crate::aws::{classify_sdk_error, sdk_credentials, tag_map, to_utc};
use crate::error::ScanFailure;
use crate::record::ResourceRecord;
use crate::scanner::Scanner;

/// Scanner for RDS database instances
pub struct RdsInstanceScanner;

fn client(creds: &Credentials, region: &str) -> Client {
    let conf = aws_sdk_rds::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(sdk_credentials(creds))
        .build();
    Client::from_conf(conf)
}

#[async_trait::async_trait]
impl Scanner for RdsInstanceScanner {
    fn resource_type(&self) -> &'static str {
        "rds-instances"
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

        let mut pages = client.describe_db_instances().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error("DescribeDBInstances", &e))?;

            for db in page.db_instances() {
                let record =
                    ResourceRecord::new(self.resource_type(), account_id, account_name, region)
                        .field_opt("db_instance_id", db.db_instance_identifier())
                        .field_opt("arn", db.db_instance_arn())
                        .field_opt("engine", db.engine())
                        .field_opt("engine_version", db.engine_version())
                        .field_opt("instance_class", db.db_instance_class())
                        .field_opt("status", db.db_instance_status())
                        .field_opt("endpoint", db.endpoint().and_then(|e| e.address()))
                        .field_opt("created", db.instance_create_time().and_then(to_utc))
                        .with_tags(tag_map(
                            db.tag_list().iter().map(|t| (t.key(), t.value())),
                        ));

                records.push(record);
            }
        }

        debug!(
            account = %account_id,
            region = %region,
            count = records.len(),
            "scanned rds instances"
        );

        Ok(records)
    }
}
