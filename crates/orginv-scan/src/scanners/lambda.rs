//! Lambda function scanner

use std::collections::BTreeMap;

use aws_sdk_lambda::Client;
use aws_sdk_lambda::config::{BehaviorVersion, Region};
use aws_sdk_lambda::error::DisplayErrorContext;
use tracing::debug;

use orginv_auth::Credentials;

use crate::aws::{classify_sdk_error, sdk_credentials};
use crate::error::ScanFailure;
use crate::record::ResourceRecord;
use crate::scanner::Scanner;

/// Scanner for Lambda functions
pub struct LambdaFunctionScanner;

fn client(creds: &Credentials, region: &str) -> Client {
    let conf = aws_sdk_lambda::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(sdk_credentials(creds))
        .build();
    Client::from_conf(conf)
}

impl LambdaFunctionScanner {
    /// Fetch tags for one function; failures degrade to an empty tag map so
    /// one untaggable function never fails the whole unit.
    async fn fetch_tags(client: &Client, arn: &str) -> BTreeMap<String, String> {
        match client.list_tags().resource(arn).send().await {
            Ok(resp) => resp
                .tags()
                .map(|tags| {
                    tags.iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            Err(e) => {
                debug!(
                    function = %arn,
                    error = %DisplayErrorContext(&e),
                    "failed to fetch function tags"
                );
                BTreeMap::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl Scanner for LambdaFunctionScanner {
    fn resource_type(&self) -> &'static str {
        "lambda-functions"
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

        let mut pages = client.list_functions().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error("ListFunctions", &e))?;

            for function in page.functions() {
                let arn = function.function_arn().unwrap_or_default();
                let tags = Self::fetch_tags(&client, arn).await;

                let record =
                    ResourceRecord::new(self.resource_type(), account_id, account_name, region)
                        .field_opt("function_name", function.function_name())
                        .field("arn", arn)
                        .field_opt("runtime", function.runtime().map(|r| r.as_str()))
                        .field_opt("handler", function.handler())
                        .field_opt("memory_mb", function.memory_size())
                        .field_opt("timeout_secs", function.timeout())
                        .field("code_size_bytes", function.code_size())
                        .field_opt("last_modified", function.last_modified())
                        .with_tags(tags);

                records.push(record);
            }
        }

        debug!(
            account = %account_id,
            region = %region,
            count = records.len(),
            "scanned lambda functions"
        );

        Ok(records)
    }
}
