use clap::{Args, Parser, Subcommand};

pub mod commands;
pub mod console;
pub mod prompt;

#[derive(Parser)]
#[command(name = "org-provision")]
#[command(about = "Provision AWS Organizations member accounts and bootstrap resources in them")]
#[command(long_about = "org-provision walks an operator through choosing or creating an AWS Organizations \
                       member account, placing it under an organizational unit, and creating IAM users, \
                       KMS keys, secrets and ACM certificates inside it. Start with \
                       'org-provision setup-organization-account'.")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Named AWS profile for the management account credentials
    #[arg(long, global = true, help = "AWS profile to use instead of the default credential chain")]
    pub profile: Option<String>,

    /// AWS region for the base configuration
    #[arg(long, global = true, help = "AWS region override for the management account session")]
    pub region: Option<String>,

    /// Seconds between status checks while waiting on account or certificate jobs
    #[arg(
        long,
        global = true,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds to wait between status checks of long-running jobs"
    )]
    pub poll_interval_secs: Option<u64>,

    /// Log progress details to stderr
    #[arg(long, short = 'v', global = true, help = "Enable debug logging on stderr")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose or create an organization account and add some useful resources in it
    #[command(alias = "setup")]
    SetupOrganizationAccount,
    /// Write the effective configuration to org-provision.toml
    InitConfig {
        /// Overwrite an existing org-provision.toml
        #[arg(long, help = "Overwrite org-provision.toml if it already exists")]
        force: bool,
    },
}
