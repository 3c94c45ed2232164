use anyhow::Result;
use clap::Parser;

use org_provision::cli::commands::init_config::InitConfigCommand;
use org_provision::cli::commands::setup_account::SetupAccountCommand;
use org_provision::cli::commands::{show_how_to_get_started, Command};
use org_provision::cli::{Cli, Commands, GlobalArgs};
use org_provision::config::OrgProvisionConfig;
use org_provision::shutdown::{interrupted_notice, run_until_interrupted, Interruptible};
use org_provision::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    OrgProvisionConfig::load_env_file()?;
    let mut config = OrgProvisionConfig::load()?;
    apply_overrides(&mut config, &cli.global);
    init_telemetry(&config.observability)?;

    match cli.command {
        None => show_how_to_get_started(),
        Some(Commands::SetupOrganizationAccount) => {
            let command = SetupAccountCommand::new(config);
            tokio::runtime::Runtime::new()?.block_on(async {
                match run_until_interrupted(command.execute()).await {
                    Interruptible::Completed(result) => result,
                    Interruptible::Interrupted => {
                        println!();
                        println!("{}", interrupted_notice());
                        Ok(())
                    }
                }
            })
        }
        Some(Commands::InitConfig { force }) => {
            tokio::runtime::Runtime::new()?.block_on(async {
                InitConfigCommand::new(config, force).execute().await
            })
        }
    }
}

/// Command-line flags win over files and environment.
fn apply_overrides(config: &mut OrgProvisionConfig, args: &GlobalArgs) {
    if let Some(profile) = &args.profile {
        config.aws.profile = Some(profile.clone());
    }
    if let Some(region) = &args.region {
        config.aws.region = Some(region.clone());
    }
    if let Some(secs) = args.poll_interval_secs {
        config.polling.interval_ms = secs.saturating_mul(1000);
    }
    if args.verbose {
        config.observability.log_level = "org_provision=debug,info".to_string();
    }
}
