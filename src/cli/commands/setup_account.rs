use anyhow::Result;
use tracing::{info, Instrument};

use crate::aws::types::Account;
use crate::aws::{self, CredentialExchange, DirectoryClient, OrganizationsDirectory};
use crate::cli::commands::resource_actions::ResourceActionsMenu;
use crate::cli::commands::{run_step, Command};
use crate::cli::console;
use crate::cli::prompt::{DialoguerPrompter, Prompter};
use crate::config::OrgProvisionConfig;
use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflows::provisioning::{
    AccountChoice, AccountProvisioner, OrganizationContext, OrganizationalUnitChoice,
    ProvisioningOutcome,
};
use crate::workflows::JobPoller;

const CREATE_ACCOUNT: &str = "Create a new account";
const CREATE_ORGANIZATIONAL_UNIT: &str = "Create a new organizational unit";

pub struct SetupAccountCommand {
    config: OrgProvisionConfig,
    prompter: DialoguerPrompter,
}

impl SetupAccountCommand {
    pub fn new(config: OrgProvisionConfig) -> Self {
        Self {
            config,
            prompter: DialoguerPrompter,
        }
    }
}

impl Command for SetupAccountCommand {
    async fn execute(&self) -> Result<()> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span("setup-organization-account", &correlation_id);

        async {
            let sdk_config = aws::load_sdk_config(
                self.config.aws.profile.as_deref(),
                self.config.aws.region.as_deref(),
            )
            .await;
            let directory = OrganizationsDirectory::new(&sdk_config)
                .with_page_size(self.config.organizations.page_size);
            let poller = JobPoller::new(self.config.poll_config());

            let Some(account) =
                provision_interactively(&directory, &self.prompter, poller.clone()).await?
            else {
                return Ok(());
            };

            info!(account_id = %account.id, "Switching to member account credentials");
            let session = CredentialExchange::new(sdk_config)
                .session_for(&account.id)
                .await;

            ResourceActionsMenu::new(&session, &self.prompter, poller)
                .run()
                .await
        }
        .instrument(span)
        .await
    }
}

/// Walk the operator through choosing or creating an account.
///
/// AWS failures are reported on the console and yield `Ok(None)`; only
/// terminal I/O errors are returned.
pub async fn provision_interactively<D, P>(
    directory: &D,
    prompter: &P,
    poller: JobPoller,
) -> Result<Option<Account>>
where
    D: DirectoryClient + ?Sized,
    P: Prompter,
{
    let provisioner = AccountProvisioner::new(directory, poller);

    let context = match run_step("Fetching organization", provisioner.load_context()).await {
        Ok(Some(context)) => context,
        Ok(None) => {
            console::warning("No organization found");
            return Ok(None);
        }
        Err(e) => {
            console::report_error(&e);
            return Ok(None);
        }
    };

    let choice = choose_account(prompter, &context)?;
    let label = match &choice {
        AccountChoice::Existing(account) => format!("Looking up account '{}'", account.name),
        AccountChoice::CreateNew { name, .. } => format!("Creating new account '{name}'"),
    };

    match run_step(&label, provisioner.run(&context, choice)).await {
        Ok(ProvisioningOutcome::Created {
            account,
            organizational_unit,
        }) => {
            println!(
                "✅ Account '{}' ({}) is ready under organizational unit '{}'",
                account.name, account.id, organizational_unit.name
            );
            Ok(Some(account))
        }
        Ok(ProvisioningOutcome::Existing { account, location }) => {
            println!("📋 Using account '{}' ({}) in {}", account.name, account.id, location);
            Ok(Some(account))
        }
        Ok(ProvisioningOutcome::CreationFailed { reason }) => {
            println!("❌ Account creation failed: {reason}");
            console::warning("No account found");
            Ok(None)
        }
        Err(e) => {
            console::report_error(&e);
            Ok(None)
        }
    }
}

/// Collect the operator's choice of account, creating OU and account details as needed.
pub fn choose_account<P: Prompter>(prompter: &P, context: &OrganizationContext) -> Result<AccountChoice> {
    let mut items = vec![CREATE_ACCOUNT.to_string()];
    items.extend(
        context
            .accounts
            .iter()
            .map(|account| format!("{} ({})", account.name, account.id)),
    );
    if context.accounts.is_empty() {
        println!("📋 There are no existing accounts");
    }

    let selected = prompter.select("Which account should be used?", &items)?;
    if let Some(account) = selected.checked_sub(1).and_then(|i| context.accounts.get(i)) {
        return Ok(AccountChoice::Existing(account.clone()));
    }

    let organizational_unit = choose_organizational_unit(prompter, context)?;
    let unit_name = match &organizational_unit {
        OrganizationalUnitChoice::Existing(unit) => unit.name.as_str(),
        OrganizationalUnitChoice::CreateNew { name } => name.as_str(),
    };
    let name = prompter.input(&format!(
        "Name of the new account to be placed under organizational unit '{unit_name}'"
    ))?;
    let email = prompter.input("And what about the email address?")?;

    Ok(AccountChoice::CreateNew {
        organizational_unit,
        name,
        email,
    })
}

fn choose_organizational_unit<P: Prompter>(
    prompter: &P,
    context: &OrganizationContext,
) -> Result<OrganizationalUnitChoice> {
    let mut items = vec![CREATE_ORGANIZATIONAL_UNIT.to_string()];
    items.extend(context.organizational_units.iter().map(|unit| unit.name.clone()));
    if context.organizational_units.is_empty() {
        println!("📋 There are no existing organizational units");
    }

    let selected = prompter.select(
        "What should be the parent organizational unit of the account?",
        &items,
    )?;
    if let Some(unit) = selected
        .checked_sub(1)
        .and_then(|i| context.organizational_units.get(i))
    {
        return Ok(OrganizationalUnitChoice::Existing(unit.clone()));
    }

    let name = prompter.input("Name of the new parent organizational unit")?;
    Ok(OrganizationalUnitChoice::CreateNew { name })
}
