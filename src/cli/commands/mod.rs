use std::future::Future;

use anyhow::Result;

use crate::aws::AwsError;
use crate::cli::console;

pub mod init_config;
pub mod resource_actions;
pub mod setup_account;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Run one AWS step behind a "🔄 label... ✅" progress line.
pub async fn run_step<T, F>(label: &str, work: F) -> Result<T, AwsError>
where
    F: Future<Output = Result<T, AwsError>>,
{
    console::step(label);
    let result = work.await;
    match &result {
        Ok(_) => console::step_done(),
        Err(_) => console::step_failed(),
    }
    result
}

pub fn show_how_to_get_started() -> Result<()> {
    println!("🏢 org-provision - AWS Organizations account provisioning");
    println!();
    println!("To get started:");
    println!("  🚀 org-provision setup-organization-account   # Choose or create an account");
    println!("  ⚙️  org-provision init-config                  # Write org-provision.toml");
    println!();
    println!("💡 Credentials come from the default AWS chain; pass --profile to pick another.");
    Ok(())
}
