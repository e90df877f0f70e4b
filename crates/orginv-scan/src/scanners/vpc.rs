//! VPC scanner

use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::{BehaviorVersion, Region};
use tracing::debug;

use orginv_auth::Credentials;

use crate::aws::{classify_sdk_error, sdk_credentials, tag_map};
use crate::error::ScanFailure;
use crate::record::ResourceRecord;
use crate::scanner::Scanner;

/// Scanner for VPCs
pub struct VpcScanner;

fn client(creds: &Credentials, region: &str) -> Client {
    let conf = aws_sdk_ec2::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(sdk_credentials(creds))
        .build();
    Client::from_conf(conf)
}

#[async_trait::async_trait]
impl Scanner for VpcScanner {
    fn resource_type(&self) -> &'static str {
        "vpcs"
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

        let mut pages = client.describe_vpcs().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error("DescribeVpcs", &e))?;

            for vpc in page.vpcs() {
                let record =
                    ResourceRecord::new(self.resource_type(), account_id, account_name, region)
                        .field_opt("vpc_id", vpc.vpc_id())
                        .field_opt("cidr_block", vpc.cidr_block())
                        .field_opt("state", vpc.state().map(|s| s.as_str()))
                        .field_opt(
                            "is_default",
                            vpc.is_default().map(|d| if d { "true" } else { "false" }),
                        )
                        .field_opt("owner_id", vpc.owner_id())
                        .with_tags(tag_map(vpc.tags().iter().map(|t| (t.key(), t.value()))));

                records.push(record);
            }
        }

        debug!(
            account = %account_id,
            region = %region,
            count = records.len(),
            "scanned vpcs"
        );

        Ok(records)
    }
}
