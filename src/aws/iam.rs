use aws_sdk_iam::Client as IamClient;
use tracing::{debug, instrument};

use super::types::{AccessKey, IamPolicy, IamUser};
use super::AwsError;

/// IAM allows at most two access keys per user.
pub const MAX_ACCESS_KEYS_PER_USER: usize = 2;

#[derive(Debug, Clone)]
pub struct IamService {
    client: IamClient,
}

impl IamService {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: IamClient::new(config),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<IamUser>, AwsError> {
        let mut pages = self.client.list_users().into_paginator().page_size(20).send();

        let mut users = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("ListUsers", e))?;
            users.extend(page.users().iter().map(|user| IamUser {
                name: user.user_name().to_string(),
                arn: user.arn().to_string(),
            }));
        }
        Ok(users)
    }

    #[instrument(skip(self))]
    pub async fn create_user(&self, user_name: &str) -> Result<IamUser, AwsError> {
        let output = self
            .client
            .create_user()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateUser", e).into_creation(format!("user '{user_name}'")))?;

        output
            .user()
            .map(|user| IamUser {
                name: user.user_name().to_string(),
                arn: user.arn().to_string(),
            })
            .ok_or_else(|| AwsError::missing("CreateUser", "User"))
    }

    #[instrument(skip(self))]
    pub async fn list_policies(&self) -> Result<Vec<IamPolicy>, AwsError> {
        let mut pages = self
            .client
            .list_policies()
            .into_paginator()
            .page_size(20)
            .send();

        let mut policies = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("ListPolicies", e))?;
            policies.extend(page.policies().iter().filter_map(|policy| {
                Some(IamPolicy {
                    name: policy.policy_name()?.to_string(),
                    arn: policy.arn()?.to_string(),
                })
            }));
        }
        debug!(count = policies.len(), "Listed IAM policies");
        Ok(policies)
    }

    #[instrument(skip(self))]
    pub async fn attach_user_policies(
        &self,
        user_name: &str,
        policy_arns: &[String],
    ) -> Result<(), AwsError> {
        for policy_arn in policy_arns {
            self.client
                .attach_user_policy()
                .user_name(user_name)
                .policy_arn(policy_arn)
                .send()
                .await
                .map_err(|e| AwsError::from_sdk("AttachUserPolicy", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn count_access_keys(&self, user_name: &str) -> Result<usize, AwsError> {
        let output = self
            .client
            .list_access_keys()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("ListAccessKeys", e))?;
        Ok(output.access_key_metadata().len())
    }

    #[instrument(skip(self))]
    pub async fn create_access_key(&self, user_name: &str) -> Result<AccessKey, AwsError> {
        let output = self
            .client
            .create_access_key()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| {
                AwsError::from_sdk("CreateAccessKey", e)
                    .into_creation(format!("access key for '{user_name}'"))
            })?;

        output
            .access_key()
            .map(|key| AccessKey {
                user_name: key.user_name().to_string(),
                access_key_id: key.access_key_id().to_string(),
                secret_access_key: key.secret_access_key().to_string(),
            })
            .ok_or_else(|| AwsError::missing("CreateAccessKey", "AccessKey"))
    }
}

/// Whether the user still has room for another access key.
pub fn can_create_access_key(existing_keys: usize) -> bool {
    existing_keys < MAX_ACCESS_KEYS_PER_USER
}
