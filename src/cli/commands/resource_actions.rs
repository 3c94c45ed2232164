use anyhow::Result;
use tracing::{info, warn};

use crate::aws::iam::can_create_access_key;
use crate::aws::kms::pretty_policy;
use crate::aws::types::{IamUser, KmsKey};
use crate::aws::{AwsError, MemberAccountSession};
use crate::cli::commands::run_step;
use crate::cli::console;
use crate::cli::prompt::Prompter;
use crate::workflows::certificates::{CertificateIssuer, CertificateRequest};
use crate::workflows::{JobOutcome, JobPoller};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Done,
    SetupUser,
    CreateKmsKey,
    CreateSecret,
    RequestCertificate,
}

impl ResourceAction {
    pub const ALL: [ResourceAction; 5] = [
        ResourceAction::Done,
        ResourceAction::SetupUser,
        ResourceAction::CreateKmsKey,
        ResourceAction::CreateSecret,
        ResourceAction::RequestCertificate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ResourceAction::Done => "Done",
            ResourceAction::SetupUser => "Setup an IAM user",
            ResourceAction::CreateKmsKey => "Create a KMS encryption key",
            ResourceAction::CreateSecret => "Create a Secrets Manager secret",
            ResourceAction::RequestCertificate => "Request a Certificate Manager certificate",
        }
    }
}

/// Which KMS key a new secret is encrypted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretKeyChoice {
    /// The account's `aws/secretsmanager` managed key
    Default,
    /// A key ARN typed in by the operator
    Manual,
    Existing(String),
}

const SECRET_KEY_OPTIONS: [&str; 2] = [
    "Use default (aws/secretsmanager)",
    "Provide a KMS key yourself",
];

fn secret_key_items(keys: &[KmsKey]) -> Vec<String> {
    SECRET_KEY_OPTIONS
        .iter()
        .map(|option| option.to_string())
        .chain(keys.iter().map(|key| key.display_name().to_string()))
        .collect()
}

fn secret_key_choice(selected: usize, keys: &[KmsKey]) -> SecretKeyChoice {
    match selected {
        0 => SecretKeyChoice::Default,
        1 => SecretKeyChoice::Manual,
        n => keys
            .get(n - SECRET_KEY_OPTIONS.len())
            .map(|key| SecretKeyChoice::Existing(key.key_id.clone()))
            .unwrap_or(SecretKeyChoice::Default),
    }
}

/// Menu of resources to create inside the selected member account.
pub struct ResourceActionsMenu<'a, P: Prompter> {
    session: &'a MemberAccountSession,
    prompter: &'a P,
    poller: JobPoller,
}

impl<'a, P: Prompter> ResourceActionsMenu<'a, P> {
    pub fn new(session: &'a MemberAccountSession, prompter: &'a P, poller: JobPoller) -> Self {
        Self {
            session,
            prompter,
            poller,
        }
    }

    /// Loop until the operator picks "Done". AWS failures are reported and the menu continues.
    pub async fn run(&self) -> Result<()> {
        let items: Vec<String> = ResourceAction::ALL
            .iter()
            .map(|action| action.label().to_string())
            .collect();

        loop {
            let selected = self
                .prompter
                .select("Choose a resource to create in the selected account", &items)?;
            let action = ResourceAction::ALL
                .get(selected)
                .copied()
                .unwrap_or(ResourceAction::Done);

            let result = match action {
                ResourceAction::Done => return Ok(()),
                ResourceAction::SetupUser => self.setup_user().await,
                ResourceAction::CreateKmsKey => self.create_kms_key().await,
                ResourceAction::CreateSecret => self.create_secret().await,
                ResourceAction::RequestCertificate => self.request_certificate().await,
            };

            if let Err(e) = result {
                match e.downcast_ref::<AwsError>() {
                    Some(aws_error) => {
                        warn!(account_id = self.session.account_id(), action = action.label(), "Resource action failed");
                        console::report_error(aws_error);
                    }
                    None => return Err(e),
                }
            }
            println!();
        }
    }

    async fn setup_user(&self) -> Result<()> {
        let iam = self.session.iam();
        let users = run_step("Fetching IAM users", iam.list_users()).await?;

        let mut items = vec!["Create new user".to_string()];
        items.extend(users.iter().map(|user| user.name.clone()));
        let selected = self
            .prompter
            .select("Choose an existing IAM user, or create a new one", &items)?;

        let user: IamUser = match selected.checked_sub(1).and_then(|i| users.get(i)) {
            Some(user) => user.clone(),
            None => {
                let name = self.prompter.input("What should be the name of the user?")?;
                run_step(&format!("Creating user '{name}'"), iam.create_user(&name)).await?
            }
        };

        let policies = run_step("Fetching IAM policies", iam.list_policies()).await?;
        let policy_names: Vec<String> = policies.iter().map(|policy| policy.name.clone()).collect();
        let chosen = self
            .prompter
            .multi_select("Select permissions policies to attach to the user", &policy_names)?;
        let policy_arns: Vec<String> = chosen
            .into_iter()
            .filter_map(|i| policies.get(i).map(|policy| policy.arn.clone()))
            .collect();
        if !policy_arns.is_empty() {
            run_step(
                &format!("Attaching {} policies to '{}'", policy_arns.len(), user.name),
                iam.attach_user_policies(&user.name, &policy_arns),
            )
            .await?;
        }

        let existing_keys = iam.count_access_keys(&user.name).await?;
        if !can_create_access_key(existing_keys) {
            println!("📋 '{}' already has {existing_keys} access keys", user.name);
            return Ok(());
        }

        if self
            .prompter
            .confirm("Would you like to create an access key for programmatic use?", false)?
        {
            let key = run_step("Creating access key", iam.create_access_key(&user.name)).await?;
            println!(
                "{}",
                console::table(
                    &["User name", "Access key id", "Secret access key"],
                    &[vec![key.user_name, key.access_key_id, key.secret_access_key]],
                )
            );
        }
        Ok(())
    }

    async fn create_kms_key(&self) -> Result<()> {
        let kms = self.session.kms();
        let alias = self
            .prompter
            .input("What should be the alias name of the new KMS key?")?;
        let key = run_step("Creating new key", kms.create_key(&alias)).await?;
        info!(key_id = %key.key_id, "Created KMS key");

        println!(
            "{}",
            console::table(
                &["Key alias", "Key ARN"],
                &[vec![
                    key.display_name().to_string(),
                    key.arn.clone().unwrap_or_else(|| key.key_id.clone()),
                ]],
            )
        );

        if !self
            .prompter
            .confirm("Would you like to edit the key policy of the key?", false)?
        {
            return Ok(());
        }

        let policy = pretty_policy(&kms.get_key_policy(&key.key_id).await?);
        match self.prompter.edit(&policy)? {
            Some(edited) if edited.trim() != policy.trim() => {
                run_step("Updating key policy", kms.put_key_policy(&key.key_id, &edited)).await?;
            }
            _ => println!("📋 Key policy left unchanged"),
        }
        Ok(())
    }

    async fn create_secret(&self) -> Result<()> {
        let name = self
            .prompter
            .input("What should be the name of the new secret?")?;
        let keys = run_step("Fetching existing KMS keys", self.session.kms().list_keys()).await?;

        let selected = self.prompter.select(
            "Choose an existing KMS key, or use the default (aws/secretsmanager)",
            &secret_key_items(&keys),
        )?;
        let kms_key_id = match secret_key_choice(selected, &keys) {
            SecretKeyChoice::Default => None,
            SecretKeyChoice::Manual => Some(self.prompter.input(
                "What is the ARN of the KMS key you want the new secret to use?",
            )?),
            SecretKeyChoice::Existing(key_id) => Some(key_id),
        };

        let secret = run_step(
            "Creating new secret",
            self.session
                .secrets()
                .create_secret(&name, kms_key_id.as_deref()),
        )
        .await?;

        println!(
            "{}",
            console::table(&["Secret name", "Secret ARN"], &[vec![secret.name, secret.arn]])
        );
        Ok(())
    }

    async fn request_certificate(&self) -> Result<()> {
        let regions = run_step(
            "Fetching available regions",
            self.session.regions().list_enabled_regions(),
        )
        .await?;
        if regions.is_empty() {
            console::warning("No enabled regions found");
            return Ok(());
        }

        let selected = self
            .prompter
            .select("Which region should this certificate be created in?", &regions)?;
        let region = regions.get(selected).cloned();

        let domains = self
            .prompter
            .input("Provide a comma separated list of FQDN's, starting with the main one")?;
        let request = match CertificateRequest::parse(&domains) {
            Ok(request) => request,
            Err(e) => {
                console::warning(&e.to_string());
                return Ok(());
            }
        };

        let client = self.session.certificates(region);
        let issuer = CertificateIssuer::new(&client, self.poller.clone());
        match run_step("Requesting new certificate", issuer.issue(&request)).await? {
            JobOutcome::Succeeded(certificate) => {
                println!(
                    "{}",
                    console::table(&["Certificate ARN"], &[vec![certificate.arn.clone()]])
                );
                println!();
                let records: Vec<_> = certificate.validation_records().cloned().collect();
                println!("{}", console::records_table(&records));
            }
            JobOutcome::Failed { reason } => {
                println!("❌ Certificate request failed: {reason}");
            }
        }
        Ok(())
    }
}
