//! Credential exchange for member accounts.
//!
//! A session for a member account wraps an `AssumeRoleProvider` for the
//! organization access role. Nothing is fetched until the first service call;
//! the SDK identity cache refreshes the credentials as they near expiry.

use aws_config::sts::AssumeRoleProvider;
use aws_config::SdkConfig;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_smithy_async::time::SystemTimeSource;
use tracing::debug;

use super::certificates::AcmCertificates;
use super::iam::IamService;
use super::kms::KmsService;
use super::regions::RegionService;
use super::secrets::SecretsService;

/// Role that Organizations creates in every account it provisions.
pub const ORGANIZATION_ACCESS_ROLE: &str = "OrganizationAccountAccessRole";

pub fn role_arn(account_id: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{ORGANIZATION_ACCESS_ROLE}")
}

pub fn session_name(account_id: &str) -> String {
    format!("temp-{account_id}")
}

/// Mints member-account sessions from the operator's own credentials.
#[derive(Debug, Clone)]
pub struct CredentialExchange {
    base: SdkConfig,
}

impl CredentialExchange {
    /// The assume-role provider stamps sessions with the config's clock, so a
    /// base config without a time source gets the system clock.
    pub fn new(base: SdkConfig) -> Self {
        let base = match base.time_source() {
            Some(_) => base,
            None => base.into_builder().time_source(SystemTimeSource::new()).build(),
        };
        Self { base }
    }

    pub async fn session_for(&self, account_id: &str) -> MemberAccountSession {
        let provider = AssumeRoleProvider::builder(role_arn(account_id))
            .session_name(session_name(account_id))
            .configure(&self.base)
            .build()
            .await;
        debug!(account_id, "Prepared assume-role credentials provider");

        let config = self
            .base
            .clone()
            .into_builder()
            .credentials_provider(SharedCredentialsProvider::new(provider))
            .build();

        MemberAccountSession {
            account_id: account_id.to_string(),
            config,
        }
    }
}

/// SDK configuration scoped to one member account.
#[derive(Debug, Clone)]
pub struct MemberAccountSession {
    account_id: String,
    config: SdkConfig,
}

impl MemberAccountSession {
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn iam(&self) -> IamService {
        IamService::new(&self.config)
    }

    pub fn kms(&self) -> KmsService {
        KmsService::new(&self.config)
    }

    pub fn secrets(&self) -> SecretsService {
        SecretsService::new(&self.config)
    }

    pub fn regions(&self) -> RegionService {
        RegionService::new(&self.config)
    }

    pub fn certificates(&self, region: Option<String>) -> AcmCertificates {
        AcmCertificates::new(&self.config, region)
    }
}
