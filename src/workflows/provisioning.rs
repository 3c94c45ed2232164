//! Account provisioning: resolve the target OU, create the account, wait for
//! the creation job, move the account out of the root and read it back.
//!
//! Every step is a forward-only remote mutation. A failure after the account
//! exists leaves it at the organization root for the operator to handle.

use async_trait::async_trait;
use std::fmt;
use tracing::{info, info_span, warn, Instrument};

use crate::aws::types::{
    Account, Organization, OrganizationRoot, OrganizationalUnit, ParentKind, ParentNode,
};
use crate::aws::{AwsError, DirectoryClient};
use crate::telemetry::OperationTimer;
use crate::workflows::poller::{AsyncJob, JobOutcome, JobPoller, JobSnapshot};

/// Everything the operator chooses from, fetched once per run.
#[derive(Debug, Clone)]
pub struct OrganizationContext {
    pub organization: Organization,
    pub root: OrganizationRoot,
    pub organizational_units: Vec<OrganizationalUnit>,
    pub accounts: Vec<Account>,
}

impl OrganizationContext {
    pub fn find_organizational_unit(&self, id: &str) -> Option<&OrganizationalUnit> {
        self.organizational_units.iter().find(|unit| unit.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationalUnitChoice {
    Existing(OrganizationalUnit),
    CreateNew { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountChoice {
    Existing(Account),
    CreateNew {
        organizational_unit: OrganizationalUnitChoice,
        name: String,
        email: String,
    },
}

/// Where an existing account sits in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountLocation {
    Root,
    /// An OU listed directly under the root
    OrganizationalUnit(OrganizationalUnit),
    /// An OU deeper in the hierarchy, known only by id
    NestedOrganizationalUnit { id: String },
}

impl AccountLocation {
    pub fn resolve(parent: ParentNode, context: &OrganizationContext) -> Self {
        match parent.kind {
            ParentKind::Root => AccountLocation::Root,
            ParentKind::OrganizationalUnit => match context.find_organizational_unit(&parent.id) {
                Some(unit) => AccountLocation::OrganizationalUnit(unit.clone()),
                None => AccountLocation::NestedOrganizationalUnit { id: parent.id },
            },
        }
    }
}

impl fmt::Display for AccountLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountLocation::Root => write!(f, "the organization root"),
            AccountLocation::OrganizationalUnit(unit) => {
                write!(f, "organizational unit '{}'", unit.name)
            }
            AccountLocation::NestedOrganizationalUnit { id } => {
                write!(f, "organizational unit {id}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    /// A new account was created and moved under `organizational_unit`.
    Created {
        account: Account,
        organizational_unit: OrganizationalUnit,
    },
    /// An existing account was chosen.
    Existing {
        account: Account,
        location: AccountLocation,
    },
    /// The creation job ended in the FAILED state.
    CreationFailed { reason: String },
}

impl ProvisioningOutcome {
    pub fn account(&self) -> Option<&Account> {
        match self {
            ProvisioningOutcome::Created { account, .. }
            | ProvisioningOutcome::Existing { account, .. } => Some(account),
            ProvisioningOutcome::CreationFailed { .. } => None,
        }
    }
}

/// The CreateAccount request as a pollable job.
struct AccountCreationJob<'a, D: DirectoryClient + ?Sized> {
    directory: &'a D,
    name: &'a str,
    email: &'a str,
}

#[async_trait]
impl<'a, D: DirectoryClient + ?Sized> AsyncJob for AccountCreationJob<'a, D> {
    type Output = String;

    fn operation(&self) -> &str {
        "CreateAccount"
    }

    async fn submit(&self) -> Result<JobSnapshot<String>, AwsError> {
        let status = self.directory.create_account(self.name, self.email).await?;
        Ok(JobSnapshot {
            request_id: status.request_id,
            status: status.state,
        })
    }

    async fn status(&self, request_id: &str) -> Result<JobSnapshot<String>, AwsError> {
        let status = self.directory.describe_create_account_status(request_id).await?;
        Ok(JobSnapshot {
            request_id: status.request_id,
            status: status.state,
        })
    }
}

pub struct AccountProvisioner<'a, D: DirectoryClient + ?Sized> {
    directory: &'a D,
    poller: JobPoller,
}

impl<'a, D: DirectoryClient + ?Sized> AccountProvisioner<'a, D> {
    pub fn new(directory: &'a D, poller: JobPoller) -> Self {
        Self { directory, poller }
    }

    /// Load the organization, its root, OUs under the root and selectable accounts.
    ///
    /// Returns `Ok(None)` when the caller is not part of an organization.
    pub async fn load_context(&self) -> Result<Option<OrganizationContext>, AwsError> {
        let (organization, root) = tokio::join!(
            self.directory.get_organization(),
            self.directory.get_organization_root()
        );

        let Some(organization) = organization? else {
            warn!("No organization found for the current credentials");
            return Ok(None);
        };
        let root = root?;

        let organizational_units = self.directory.list_organizational_units(&root.id).await?;
        let accounts = self.directory.list_accounts().await?;

        info!(
            organization_id = %organization.id,
            root_id = %root.id,
            organizational_units = organizational_units.len(),
            accounts = accounts.len(),
            "Loaded organization context"
        );

        Ok(Some(OrganizationContext {
            organization,
            root,
            organizational_units,
            accounts,
        }))
    }

    pub async fn resolve_organizational_unit(
        &self,
        root: &OrganizationRoot,
        choice: OrganizationalUnitChoice,
    ) -> Result<OrganizationalUnit, AwsError> {
        match choice {
            OrganizationalUnitChoice::Existing(unit) => Ok(unit),
            OrganizationalUnitChoice::CreateNew { name } => {
                let unit = self
                    .directory
                    .create_organizational_unit(&name, &root.id)
                    .await?;
                info!(ou_id = %unit.id, ou_name = %unit.name, "Created organizational unit");
                Ok(unit)
            }
        }
    }

    /// Create an account, wait for the job, and move it from the root into `target`.
    pub async fn create_account(
        &self,
        root: &OrganizationRoot,
        target: OrganizationalUnit,
        name: &str,
        email: &str,
    ) -> Result<ProvisioningOutcome, AwsError> {
        let timer = OperationTimer::new("create_account");
        let job = AccountCreationJob {
            directory: self.directory,
            name,
            email,
        };

        let account_id = match self.poller.run(&job).await? {
            JobOutcome::Succeeded(account_id) => account_id,
            JobOutcome::Failed { reason } => {
                warn!(account_name = name, reason = %reason, "Account creation failed");
                return Ok(ProvisioningOutcome::CreationFailed { reason });
            }
        };

        self.directory
            .move_account(&account_id, &root.id, &target.id)
            .await?;
        info!(account_id = %account_id, ou_id = %target.id, "Moved account into organizational unit");

        let account = self.directory.describe_account(&account_id).await?;
        timer.finish();

        Ok(ProvisioningOutcome::Created {
            account,
            organizational_unit: target,
        })
    }

    /// Look up where an existing account lives. Performs no mutation.
    pub async fn describe_existing(
        &self,
        context: &OrganizationContext,
        account: Account,
    ) -> Result<ProvisioningOutcome, AwsError> {
        let parent = self
            .directory
            .get_parent_organizational_unit(&account.id)
            .await?;
        let location = AccountLocation::resolve(parent, context);

        Ok(ProvisioningOutcome::Existing { account, location })
    }

    pub async fn run(
        &self,
        context: &OrganizationContext,
        choice: AccountChoice,
    ) -> Result<ProvisioningOutcome, AwsError> {
        let span = info_span!("provision_account", organization_id = %context.organization.id);

        async {
            match choice {
                AccountChoice::Existing(account) => self.describe_existing(context, account).await,
                AccountChoice::CreateNew {
                    organizational_unit,
                    name,
                    email,
                } => {
                    let target = self
                        .resolve_organizational_unit(&context.root, organizational_unit)
                        .await?;
                    self.create_account(&context.root, target, &name, &email)
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::organizations::MockDirectoryClient;
    use crate::aws::types::{AccountCreationStatus, AccountStatus, ParentKind, ParentNode};
    use crate::workflows::poller::JobStatus;
    use mockall::predicate::eq;

    fn organization() -> Organization {
        Organization {
            id: "o-abc123".to_string(),
            arn: None,
            management_account_id: Some("000000000000".to_string()),
        }
    }

    fn root() -> OrganizationRoot {
        OrganizationRoot {
            id: "r-root".to_string(),
            name: Some("Root".to_string()),
        }
    }

    fn unit(id: &str, name: &str) -> OrganizationalUnit {
        OrganizationalUnit {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            name: "workload".to_string(),
            email: "workload@example.com".to_string(),
            status: AccountStatus::Active,
            joined_at: None,
        }
    }

    fn context() -> OrganizationContext {
        OrganizationContext {
            organization: organization(),
            root: root(),
            organizational_units: vec![unit("ou-1", "Workloads")],
            accounts: vec![account("123456789012")],
        }
    }

    fn creation(state: JobStatus<String>) -> AccountCreationStatus {
        AccountCreationStatus {
            request_id: "car-1".to_string(),
            state,
        }
    }

    #[tokio::test]
    async fn test_load_context_without_organization() {
        let mut directory = MockDirectoryClient::new();
        directory.expect_get_organization().returning(|| Ok(None));
        directory
            .expect_get_organization_root()
            .returning(|| Err(AwsError::not_found("organization root")));
        directory.expect_list_organizational_units().never();
        directory.expect_list_accounts().never();

        let provisioner = AccountProvisioner::new(&directory, JobPoller::default());

        assert!(provisioner.load_context().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_context_lists_units_under_root() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_get_organization()
            .returning(|| Ok(Some(organization())));
        directory.expect_get_organization_root().returning(|| Ok(root()));
        directory
            .expect_list_organizational_units()
            .with(eq("r-root"))
            .times(1)
            .returning(|_| Ok(vec![unit("ou-1", "Workloads")]));
        directory
            .expect_list_accounts()
            .times(1)
            .returning(|| Ok(vec![account("123456789012")]));

        let provisioner = AccountProvisioner::new(&directory, JobPoller::default());
        let context = provisioner.load_context().await.unwrap().unwrap();

        assert_eq!(context.root.id, "r-root");
        assert_eq!(context.organizational_units.len(), 1);
        assert_eq!(context.accounts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_account_moves_from_root_to_target() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_create_organizational_unit()
            .with(eq("Sandbox"), eq("r-root"))
            .times(1)
            .returning(|_, _| Ok(unit("ou-new", "Sandbox")));
        directory
            .expect_create_account()
            .with(eq("sandbox"), eq("sandbox@example.com"))
            .times(1)
            .returning(|_, _| Ok(creation(JobStatus::InProgress)));
        let mut checks = 0;
        directory
            .expect_describe_create_account_status()
            .with(eq("car-1"))
            .times(3)
            .returning(move |_| {
                checks += 1;
                if checks < 3 {
                    Ok(creation(JobStatus::InProgress))
                } else {
                    Ok(creation(JobStatus::Succeeded("123456789012".to_string())))
                }
            });
        directory
            .expect_move_account()
            .with(eq("123456789012"), eq("r-root"), eq("ou-new"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        directory
            .expect_describe_account()
            .with(eq("123456789012"))
            .times(1)
            .returning(|id| Ok(account(id)));

        let provisioner = AccountProvisioner::new(&directory, JobPoller::default());
        let outcome = provisioner
            .run(
                &context(),
                AccountChoice::CreateNew {
                    organizational_unit: OrganizationalUnitChoice::CreateNew {
                        name: "Sandbox".to_string(),
                    },
                    name: "sandbox".to_string(),
                    email: "sandbox@example.com".to_string(),
                },
            )
            .await
            .unwrap();

        match outcome {
            ProvisioningOutcome::Created {
                account,
                organizational_unit,
            } => {
                assert_eq!(account.id, "123456789012");
                assert_eq!(organizational_unit.id, "ou-new");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_creation_never_moves() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_create_account()
            .returning(|_, _| Ok(creation(JobStatus::Failed("EMAIL_ALREADY_EXISTS".to_string()))));
        directory.expect_describe_create_account_status().never();
        directory.expect_move_account().never();
        directory.expect_describe_account().never();

        let provisioner = AccountProvisioner::new(&directory, JobPoller::default());
        let outcome = provisioner
            .run(
                &context(),
                AccountChoice::CreateNew {
                    organizational_unit: OrganizationalUnitChoice::Existing(unit("ou-1", "Workloads")),
                    name: "dup".to_string(),
                    email: "taken@example.com".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProvisioningOutcome::CreationFailed {
                reason: "EMAIL_ALREADY_EXISTS".to_string()
            }
        );
        assert!(outcome.account().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_failure_is_surfaced() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_create_account()
            .returning(|_, _| Ok(creation(JobStatus::Succeeded("123456789012".to_string()))));
        directory.expect_move_account().returning(|account_id, from, to| {
            Err(AwsError::Move {
                account_id: account_id.to_string(),
                source_parent_id: from.to_string(),
                destination_parent_id: to.to_string(),
                message: "SourceParentNotFoundException".to_string(),
            })
        });
        directory.expect_describe_account().never();

        let provisioner = AccountProvisioner::new(&directory, JobPoller::default());
        let err = provisioner
            .create_account(&root(), unit("ou-1", "Workloads"), "app", "app@example.com")
            .await
            .unwrap_err();

        assert!(matches!(err, AwsError::Move { .. }));
    }

    #[tokio::test]
    async fn test_existing_account_performs_no_mutation() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_get_parent_organizational_unit()
            .with(eq("123456789012"))
            .times(1)
            .returning(|_| {
                Ok(ParentNode {
                    id: "ou-1".to_string(),
                    kind: ParentKind::OrganizationalUnit,
                })
            });
        directory.expect_create_organizational_unit().never();
        directory.expect_create_account().never();
        directory.expect_move_account().never();

        let provisioner = AccountProvisioner::new(&directory, JobPoller::default());
        let outcome = provisioner
            .run(&context(), AccountChoice::Existing(account("123456789012")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ProvisioningOutcome::Existing {
                account: account("123456789012"),
                location: AccountLocation::OrganizationalUnit(unit("ou-1", "Workloads")),
            }
        );
    }

    #[tokio::test]
    async fn test_existing_account_at_root() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_get_parent_organizational_unit()
            .returning(|_| {
                Ok(ParentNode {
                    id: "r-root".to_string(),
                    kind: ParentKind::Root,
                })
            });

        let provisioner = AccountProvisioner::new(&directory, JobPoller::default());
        let outcome = provisioner
            .describe_existing(&context(), account("123456789012"))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            ProvisioningOutcome::Existing {
                location: AccountLocation::Root,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_existing_account_in_nested_unit_is_not_the_root() {
        let mut directory = MockDirectoryClient::new();
        directory
            .expect_get_parent_organizational_unit()
            .returning(|_| {
                Ok(ParentNode {
                    id: "ou-nested".to_string(),
                    kind: ParentKind::OrganizationalUnit,
                })
            });

        let provisioner = AccountProvisioner::new(&directory, JobPoller::default());
        let outcome = provisioner
            .describe_existing(&context(), account("123456789012"))
            .await
            .unwrap();

        let ProvisioningOutcome::Existing { location, .. } = outcome else {
            panic!("expected an existing account outcome");
        };
        assert_eq!(
            location,
            AccountLocation::NestedOrganizationalUnit {
                id: "ou-nested".to_string()
            }
        );
        assert_eq!(location.to_string(), "organizational unit ou-nested");
    }

    #[test]
    fn test_location_display() {
        assert_eq!(AccountLocation::Root.to_string(), "the organization root");
        assert_eq!(
            AccountLocation::OrganizationalUnit(unit("ou-1", "Workloads")).to_string(),
            "organizational unit 'Workloads'"
        );
    }
}
