//! Domain records for the organization hierarchy and the resources created in
//! member accounts. These are owned copies of the SDK shapes with explicit
//! absence instead of empty placeholder values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::poller::JobStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub arn: Option<String>,
    pub management_account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRoot {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationalUnit {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentKind {
    Root,
    OrganizationalUnit,
}

/// Immediate parent of an account or OU in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentNode {
    pub id: String,
    pub kind: ParentKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Suspended,
    PendingClosure,
    Other(String),
}

impl AccountStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "ACTIVE" => AccountStatus::Active,
            "SUSPENDED" => AccountStatus::Suspended,
            "PENDING_CLOSURE" => AccountStatus::PendingClosure,
            other => AccountStatus::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: AccountStatus,
    pub joined_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Snapshot of an asynchronous CreateAccount request.
///
/// On success the payload is the new account id; on failure the service's
/// failure reason (e.g. `EMAIL_ALREADY_EXISTS`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCreationStatus {
    pub request_id: String,
    pub state: JobStatus<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainValidationOption {
    pub domain_name: String,
    pub resource_record: Option<DnsRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub arn: String,
    pub status: Option<String>,
    pub failure_reason: Option<String>,
    pub domain_validation_options: Vec<DomainValidationOption>,
}

impl Certificate {
    /// True once at least one domain has a DNS record the operator can publish.
    pub fn has_validation_records(&self) -> bool {
        self.domain_validation_options.iter().any(|option| {
            option
                .resource_record
                .as_ref()
                .is_some_and(|record| !record.name.is_empty())
        })
    }

    pub fn validation_records(&self) -> impl Iterator<Item = &DnsRecord> {
        self.domain_validation_options
            .iter()
            .filter_map(|option| option.resource_record.as_ref())
    }

    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some("FAILED")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamUser {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamPolicy {
    pub name: String,
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKey {
    pub user_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmsKey {
    pub key_id: String,
    pub arn: Option<String>,
    pub aliases: Vec<String>,
}

impl KmsKey {
    pub fn display_name(&self) -> &str {
        self.aliases.first().map(String::as_str).unwrap_or(&self.key_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    pub arn: String,
}
