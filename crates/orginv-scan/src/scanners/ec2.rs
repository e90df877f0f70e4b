//! EC2 instance scanner

use aws_sdk_ec2::Client;
use aws_sdk_ec2::config::{BehaviorVersion, Region};
use tracing::debug;

use orginv_auth::Credentials;

use crate::aws::{classify_sdk_error, sdk_credentials, tag_map, to_utc};
use crate::error::ScanFailure;
use crate::record::ResourceRecord;
use crate::scanner::Scanner;

/// Scanner for EC2 instances
pub struct Ec2InstanceScanner;

fn client(creds: &Credentials, region: &str) -> Client {
    let conf = aws_sdk_ec2::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(sdk_credentials(creds))
        .build();
    Client::from_conf(conf)
}

#[async_trait::async_trait]
impl Scanner for Ec2InstanceScanner {
    fn resource_type(&self) -> &'static str {
        "ec2-instances"
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

        let mut pages = client.describe_instances().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error("DescribeInstances", &e))?;

            for reservation in page.reservations() {
                for instance in reservation.instances() {
                    let instance_id = instance.instance_id().unwrap_or_default();
                    let arn =
                        format!("arn:aws:ec2:{region}:{account_id}:instance/{instance_id}");

                    let record =
                        ResourceRecord::new(self.resource_type(), account_id, account_name, region)
                            .field("instance_id", instance_id)
                            .field("arn", arn)
                            .field_opt(
                                "state",
                                instance
                                    .state()
                                    .and_then(|s| s.name())
                                    .map(|n| n.as_str()),
                            )
                            .field_opt(
                                "instance_type",
                                instance.instance_type().map(|t| t.as_str()),
                            )
                            .field_opt("platform", instance.platform_details())
                            .field_opt("private_ip", instance.private_ip_address())
                            .field_opt("public_ip", instance.public_ip_address())
                            .field_opt("vpc_id", instance.vpc_id())
                            .field_opt("subnet_id", instance.subnet_id())
                            .field_opt(
                                "iam_instance_profile",
                                instance.iam_instance_profile().and_then(|p| p.arn()),
                            )
                            .field_opt("launch_time", instance.launch_time().and_then(to_utc))
                            .with_tags(tag_map(
                                instance.tags().iter().map(|t| (t.key(), t.value())),
                            ));

                    records.push(record);
                }
            }
        }

        debug!(
            account = %account_id,
            region = %region,
            count = records.len(),
            "scanned ec2 instances"
        );

        Ok(records)
    }
}
