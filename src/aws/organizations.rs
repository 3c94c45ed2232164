//! Organization hierarchy client.
//!
//! `DirectoryClient` is the seam the provisioning workflow depends on; the
//! SDK-backed `OrganizationsDirectory` is the only production implementation.

use async_trait::async_trait;
use aws_sdk_organizations::types as org;
use aws_sdk_organizations::Client as OrganizationsClient;
use aws_sdk_sts::Client as StsClient;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

use super::types::{
    Account, AccountCreationStatus, AccountStatus, Organization, OrganizationRoot,
    OrganizationalUnit, ParentKind, ParentNode,
};
use super::AwsError;
use crate::workflows::poller::JobStatus;

/// Page size used for every paginated Organizations listing.
pub const DEFAULT_PAGE_SIZE: i32 = 20;

#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// The organization the caller belongs to, or `None` when Organizations is not in use.
    async fn get_organization(&self) -> Result<Option<Organization>, AwsError>;

    /// The single root of the hierarchy.
    async fn get_organization_root(&self) -> Result<OrganizationRoot, AwsError>;

    /// Every OU directly under `parent_id`, across all pages.
    async fn list_organizational_units(
        &self,
        parent_id: &str,
    ) -> Result<Vec<OrganizationalUnit>, AwsError>;

    /// Active member accounts, excluding the account the caller runs in.
    async fn list_accounts(&self) -> Result<Vec<Account>, AwsError>;

    async fn create_organizational_unit(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<OrganizationalUnit, AwsError>;

    /// Immediate parent of an account or OU.
    async fn get_parent_organizational_unit(&self, child_id: &str) -> Result<ParentNode, AwsError>;

    async fn move_account(
        &self,
        account_id: &str,
        source_parent_id: &str,
        destination_parent_id: &str,
    ) -> Result<(), AwsError>;

    /// Submit an asynchronous CreateAccount request.
    async fn create_account(&self, name: &str, email: &str)
        -> Result<AccountCreationStatus, AwsError>;

    async fn describe_create_account_status(
        &self,
        request_id: &str,
    ) -> Result<AccountCreationStatus, AwsError>;

    async fn describe_account(&self, account_id: &str) -> Result<Account, AwsError>;
}

/// Keep only active accounts that are not the caller's own account.
pub fn selectable_accounts(accounts: Vec<Account>, caller_account_id: &str) -> Vec<Account> {
    accounts
        .into_iter()
        .filter(Account::is_active)
        .filter(|account| account.id != caller_account_id)
        .collect()
}

#[derive(Debug, Clone)]
pub struct OrganizationsDirectory {
    organizations: OrganizationsClient,
    sts: StsClient,
    page_size: i32,
}

impl OrganizationsDirectory {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self::from_clients(OrganizationsClient::new(config), StsClient::new(config))
    }

    pub fn from_clients(organizations: OrganizationsClient, sts: StsClient) -> Self {
        Self {
            organizations,
            sts,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    async fn caller_account_id(&self) -> Result<String, AwsError> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("GetCallerIdentity", e))?;
        identity
            .account()
            .map(str::to_string)
            .ok_or_else(|| AwsError::missing("GetCallerIdentity", "Account"))
    }
}

#[async_trait]
impl DirectoryClient for OrganizationsDirectory {
    #[instrument(skip(self))]
    async fn get_organization(&self) -> Result<Option<Organization>, AwsError> {
        let output = match self.organizations.describe_organization().send().await {
            Ok(output) => output,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_aws_organizations_not_in_use_exception()) =>
            {
                debug!("Organizations is not in use for this account");
                return Ok(None);
            }
            Err(err) => return Err(AwsError::from_sdk("DescribeOrganization", err)),
        };

        Ok(output.organization().and_then(|organization| {
            organization.id().map(|id| Organization {
                id: id.to_string(),
                arn: organization.arn().map(str::to_string),
                management_account_id: organization.master_account_id().map(str::to_string),
            })
        }))
    }

    #[instrument(skip(self))]
    async fn get_organization_root(&self) -> Result<OrganizationRoot, AwsError> {
        let output = self
            .organizations
            .list_roots()
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("ListRoots", e))?;

        output
            .roots()
            .iter()
            .find_map(|root| {
                root.id().map(|id| OrganizationRoot {
                    id: id.to_string(),
                    name: root.name().map(str::to_string),
                })
            })
            .ok_or_else(|| AwsError::not_found("organization root"))
    }

    #[instrument(skip(self))]
    async fn list_organizational_units(
        &self,
        parent_id: &str,
    ) -> Result<Vec<OrganizationalUnit>, AwsError> {
        let mut pages = self
            .organizations
            .list_organizational_units_for_parent()
            .parent_id(parent_id)
            .into_paginator()
            .page_size(self.page_size)
            .send();

        let mut units = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("ListOrganizationalUnitsForParent", e))?;
            units.extend(page.organizational_units().iter().filter_map(to_organizational_unit));
        }

        debug!(count = units.len(), "Listed organizational units");
        Ok(units)
    }

    #[instrument(skip(self))]
    async fn list_accounts(&self) -> Result<Vec<Account>, AwsError> {
        let mut pages = self
            .organizations
            .list_accounts()
            .into_paginator()
            .page_size(self.page_size)
            .send();

        let mut accounts = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| AwsError::from_sdk("ListAccounts", e))?;
            accounts.extend(page.accounts().iter().filter_map(to_account));
        }

        let caller_account_id = self.caller_account_id().await?;
        let accounts = selectable_accounts(accounts, &caller_account_id);
        debug!(count = accounts.len(), "Listed selectable accounts");
        Ok(accounts)
    }

    #[instrument(skip(self))]
    async fn create_organizational_unit(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<OrganizationalUnit, AwsError> {
        let resource = format!("organizational unit '{name}'");
        let output = self
            .organizations
            .create_organizational_unit()
            .name(name)
            .parent_id(parent_id)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateOrganizationalUnit", e).into_creation(&resource))?;

        output
            .organizational_unit()
            .and_then(to_organizational_unit)
            .ok_or_else(|| AwsError::missing("CreateOrganizationalUnit", "OrganizationalUnit"))
    }

    #[instrument(skip(self))]
    async fn get_parent_organizational_unit(&self, child_id: &str) -> Result<ParentNode, AwsError> {
        let output = self
            .organizations
            .list_parents()
            .child_id(child_id)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("ListParents", e))?;

        output
            .parents()
            .iter()
            .find_map(|parent| {
                let kind = match parent.r#type() {
                    Some(org::ParentType::Root) => ParentKind::Root,
                    _ => ParentKind::OrganizationalUnit,
                };
                parent.id().map(|id| ParentNode {
                    id: id.to_string(),
                    kind,
                })
            })
            .ok_or_else(|| AwsError::not_found(format!("parent of {child_id}")))
    }

    #[instrument(skip(self))]
    async fn move_account(
        &self,
        account_id: &str,
        source_parent_id: &str,
        destination_parent_id: &str,
    ) -> Result<(), AwsError> {
        self.organizations
            .move_account()
            .account_id(account_id)
            .source_parent_id(source_parent_id)
            .destination_parent_id(destination_parent_id)
            .send()
            .await
            .map_err(|e| {
                let message = match AwsError::from_sdk("MoveAccount", e) {
                    AwsError::Service { message, .. } => message,
                    other => other.to_string(),
                };
                AwsError::Move {
                    account_id: account_id.to_string(),
                    source_parent_id: source_parent_id.to_string(),
                    destination_parent_id: destination_parent_id.to_string(),
                    message,
                }
            })?;
        Ok(())
    }

    #[instrument(skip(self, email))]
    async fn create_account(
        &self,
        name: &str,
        email: &str,
    ) -> Result<AccountCreationStatus, AwsError> {
        let output = self
            .organizations
            .create_account()
            .account_name(name)
            .email(email)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("CreateAccount", e).into_creation(format!("account '{name}'")))?;

        output
            .create_account_status()
            .ok_or_else(|| AwsError::missing("CreateAccount", "CreateAccountStatus"))
            .and_then(|status| to_creation_status("CreateAccount", status))
    }

    #[instrument(skip(self))]
    async fn describe_create_account_status(
        &self,
        request_id: &str,
    ) -> Result<AccountCreationStatus, AwsError> {
        let output = self
            .organizations
            .describe_create_account_status()
            .create_account_request_id(request_id)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeCreateAccountStatus", e))?;

        output
            .create_account_status()
            .ok_or_else(|| AwsError::missing("DescribeCreateAccountStatus", "CreateAccountStatus"))
            .and_then(|status| to_creation_status("DescribeCreateAccountStatus", status))
    }

    #[instrument(skip(self))]
    async fn describe_account(&self, account_id: &str) -> Result<Account, AwsError> {
        let output = self
            .organizations
            .describe_account()
            .account_id(account_id)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DescribeAccount", e))?;

        output
            .account()
            .and_then(to_account)
            .ok_or_else(|| AwsError::not_found(format!("account {account_id}")))
    }
}

fn to_organizational_unit(unit: &org::OrganizationalUnit) -> Option<OrganizationalUnit> {
    Some(OrganizationalUnit {
        id: unit.id()?.to_string(),
        name: unit.name().unwrap_or_default().to_string(),
    })
}

fn to_account(account: &org::Account) -> Option<Account> {
    Some(Account {
        id: account.id()?.to_string(),
        name: account.name().unwrap_or_default().to_string(),
        email: account.email().unwrap_or_default().to_string(),
        status: account
            .status()
            .map(|status| AccountStatus::parse(status.as_str()))
            .unwrap_or_else(|| AccountStatus::Other("UNKNOWN".to_string())),
        joined_at: account
            .joined_timestamp()
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos())),
    })
}

fn to_creation_status(
    operation: &str,
    status: &org::CreateAccountStatus,
) -> Result<AccountCreationStatus, AwsError> {
    let request_id = status
        .id()
        .ok_or_else(|| AwsError::missing(operation, "CreateAccountStatus.Id"))?
        .to_string();

    let state = match status.state() {
        Some(org::CreateAccountState::Succeeded) => {
            let account_id = status
                .account_id()
                .ok_or_else(|| AwsError::missing(operation, "CreateAccountStatus.AccountId"))?;
            JobStatus::Succeeded(account_id.to_string())
        }
        Some(org::CreateAccountState::Failed) => JobStatus::Failed(
            status
                .failure_reason()
                .map(|reason| reason.as_str().to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
        ),
        _ => JobStatus::InProgress,
    };

    Ok(AccountCreationStatus { request_id, state })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str, status: AccountStatus) -> Account {
        Account {
            id: id.to_string(),
            name: format!("account-{id}"),
            email: format!("{id}@example.com"),
            status,
            joined_at: None,
        }
    }

    #[test]
    fn test_selectable_accounts_excludes_inactive_and_self() {
        let accounts = vec![
            account("111111111111", AccountStatus::Active),
            account("222222222222", AccountStatus::Active),
            account("333333333333", AccountStatus::Suspended),
        ];

        let selectable = selectable_accounts(accounts, "111111111111");

        assert_eq!(selectable.len(), 1);
        assert_eq!(selectable[0].id, "222222222222");
    }

    #[test]
    fn test_creation_status_maps_states() {
        let in_progress = org::CreateAccountStatus::builder()
            .id("car-1")
            .state(org::CreateAccountState::InProgress)
            .build();
        assert_eq!(
            to_creation_status("CreateAccount", &in_progress).unwrap().state,
            JobStatus::InProgress
        );

        let succeeded = org::CreateAccountStatus::builder()
            .id("car-1")
            .state(org::CreateAccountState::Succeeded)
            .account_id("123456789012")
            .build();
        assert_eq!(
            to_creation_status("DescribeCreateAccountStatus", &succeeded)
                .unwrap()
                .state,
            JobStatus::Succeeded("123456789012".to_string())
        );

        let failed = org::CreateAccountStatus::builder()
            .id("car-1")
            .state(org::CreateAccountState::Failed)
            .failure_reason(org::CreateAccountFailureReason::EmailAlreadyExists)
            .build();
        assert_eq!(
            to_creation_status("DescribeCreateAccountStatus", &failed)
                .unwrap()
                .state,
            JobStatus::Failed("EMAIL_ALREADY_EXISTS".to_string())
        );
    }

    #[test]
    fn test_succeeded_status_without_account_id_is_malformed() {
        let succeeded = org::CreateAccountStatus::builder()
            .id("car-1")
            .state(org::CreateAccountState::Succeeded)
            .build();

        let err = to_creation_status("DescribeCreateAccountStatus", &succeeded).unwrap_err();
        assert!(matches!(err, AwsError::MissingField { .. }));
    }

    #[test]
    fn test_ou_without_id_is_skipped() {
        let unit = org::OrganizationalUnit::builder().name("Orphan").build();
        assert!(to_organizational_unit(&unit).is_none());
    }
}
