use anyhow::Result;
use std::path::PathBuf;

use crate::cli::commands::Command;
use crate::config::{OrgProvisionConfig, CONFIG_FILE};

pub struct InitConfigCommand {
    pub config: OrgProvisionConfig,
    pub path: PathBuf,
    pub force: bool,
}

impl InitConfigCommand {
    pub fn new(config: OrgProvisionConfig, force: bool) -> Self {
        Self {
            config,
            path: PathBuf::from(CONFIG_FILE),
            force,
        }
    }
}

impl Command for InitConfigCommand {
    async fn execute(&self) -> Result<()> {
        if self.path.exists() && !self.force {
            println!("⚠️  {} already exists", self.path.display());
            println!("   → Re-run with --force to overwrite it");
            return Ok(());
        }

        self.config.save_to_file(&self.path)?;
        println!("✅ Wrote configuration to {}", self.path.display());
        Ok(())
    }
}
