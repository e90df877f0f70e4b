//! IAM role scanner (global resource type)

use aws_sdk_iam::Client;
use aws_sdk_iam::config::{BehaviorVersion, Region};
use tracing::debug;

use orginv_auth::Credentials;

use crate::aws::{classify_sdk_error, sdk_credentials, to_utc};
use crate::error::ScanFailure;
use crate::record::{GLOBAL_REGION, ResourceRecord};
use crate::scanner::Scanner;

/// Scanner for IAM roles, scanned once per account
pub struct IamRoleScanner;

fn client(creds: &Credentials, region: &str) -> Client {
    let conf = aws_sdk_iam::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(sdk_credentials(creds))
        .build();
    Client::from_conf(conf)
}

#[async_trait::async_trait]
impl Scanner for IamRoleScanner {
    fn resource_type(&self) -> &'static str {
        "iam-roles"
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

        let mut pages = client.list_roles().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error("ListRoles", &e))?;

            for role in page.roles() {
                let record = ResourceRecord::new(
                    self.resource_type(),
                    account_id,
                    account_name,
                    GLOBAL_REGION,
                )
                .field("role_name", role.role_name())
                .field("role_id", role.role_id())
                .field("arn", role.arn())
                .field("path", role.path())
                .field_opt("created", to_utc(role.create_date()))
                .field_opt("description", role.description())
                .field_opt("max_session_duration_secs", role.max_session_duration());

                records.push(record);
            }
        }

        debug!(
            account = %account_id,
            count = records.len(),
            "scanned iam roles"
        );

        Ok(records)
    }
}
