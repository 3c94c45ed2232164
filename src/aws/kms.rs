use aws_sdk_kms::Client as KmsClient;
use tracing::{debug, instrument};

use super::types::KmsKey;
use super::AwsError;

const DEFAULT_KEY_POLICY: &str = "default";

/// Prefix an alias with `alias/` unless the operator already did.
pub fn normalize_alias(alias: &str) -> String {
    let alias = alias.trim();
    if alias.starts_with("alias/") {
        alias.to_string()
    } else {
        format!("alias/{alias}")
    }
}

/// Re-indent a key policy for editing. Falls back to the raw text if it is not JSON.
pub fn pretty_policy(policy: &str) -> String {
    serde_json::from_str::<serde_json::Value>(policy)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| policy.to_string())
}

#[derive(Debug, Clone)]
pub struct KmsService {
    client: KmsClient,
}

impl KmsService {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: KmsClient::new(config),
        }
    }

    /// Keys that have at least one alias and are not scheduled for deletion.
    #[instrument(skip(self))]
    pub async fn list_keys(&self) -> Result<Vec<KmsKey>, AwsError> {
        let mut pages = self.client.list_keys().into_paginator().send();
        let mut key_ids = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("ListKeys", e))?;
            key_ids.extend(page.keys().iter().filter_map(|key| key.key_id().map(str::to_string)));
        }

        let mut keys = Vec::new();
        for key_id in key_ids {
            let described = self
                .client
                .describe_key()
                .key_id(&key_id)
                .send()
                .await
                .map_err(|e| AwsError::from_sdk("DescribeKey", e))?;
            let Some(metadata) = described.key_metadata() else {
                continue;
            };
            if metadata.pending_deletion_window_in_days().is_some() {
                continue;
            }

            let aliases = self
                .client
                .list_aliases()
                .key_id(&key_id)
                .send()
                .await
                .map_err(|e| AwsError::from_sdk("ListAliases", e))?;
            let aliases: Vec<String> = aliases
                .aliases()
                .iter()
                .filter_map(|alias| alias.alias_name().map(str::to_string))
                .collect();
            if aliases.is_empty() {
                continue;
            }

            keys.push(KmsKey {
                key_id,
                arn: metadata.arn().map(str::to_string),
                aliases,
            });
        }

        debug!(count = keys.len(), "Listed aliased KMS keys");
        Ok(keys)
    }

    #[instrument(skip(self))]
    pub async fn create_key(&self, alias: &str) -> Result<KmsKey, AwsError> {
        let alias = normalize_alias(alias);
        let created = self
            .client
            .create_key()
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateKey", e).into_creation("KMS key"))?;
        let metadata = created
            .key_metadata()
            .ok_or_else(|| AwsError::missing("CreateKey", "KeyMetadata"))?;
        let key_id = metadata.key_id().to_string();

        self.client
            .create_alias()
            .alias_name(&alias)
            .target_key_id(&key_id)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateAlias", e).into_creation(format!("alias '{alias}'")))?;

        Ok(KmsKey {
            key_id,
            arn: metadata.arn().map(str::to_string),
            aliases: vec![alias],
        })
    }

    #[instrument(skip(self))]
    pub async fn get_key_policy(&self, key_id: &str) -> Result<String, AwsError> {
        let output = self
            .client
            .get_key_policy()
            .key_id(key_id)
            .policy_name(DEFAULT_KEY_POLICY)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("GetKeyPolicy", e))?;
        output
            .policy()
            .map(str::to_string)
            .ok_or_else(|| AwsError::missing("GetKeyPolicy", "Policy"))
    }

    #[instrument(skip(self, policy))]
    pub async fn put_key_policy(&self, key_id: &str, policy: &str) -> Result<(), AwsError> {
        self.client
            .put_key_policy()
            .key_id(key_id)
            .policy_name(DEFAULT_KEY_POLICY)
            .policy(policy)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("PutKeyPolicy", e))?;
        Ok(())
    }
}
