use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::aws::organizations::DEFAULT_PAGE_SIZE;
use crate::workflows::poller::{PollConfig, DEFAULT_POLL_INTERVAL};

pub const CONFIG_FILE: &str = "org-provision.toml";
pub const RC_FILE: &str = ".org-provision-rc";

/// Main configuration structure for org-provision
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OrgProvisionConfig {
    pub aws: AwsConfig,
    pub polling: PollingConfig,
    pub organizations: OrganizationsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// Unset polls until the job finishes
    pub max_attempts: Option<u32>,
    pub max_transient_errors: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_attempts: None,
            max_transient_errors: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrganizationsConfig {
    pub page_size: i32,
}

impl Default for OrganizationsConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter directive used when RUST_LOG is unset
    pub log_level: String,
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl OrgProvisionConfig {
    /// Load configuration from the current directory. See [`Self::load_from`].
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load configuration with precedence, lowest first:
    /// 1. Default values
    /// 2. Configuration files (org-provision.toml, .org-provision-rc) in `dir`
    /// 3. Environment variables such as ORG_PROVISION__POLLING__INTERVAL_MS
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        for name in [CONFIG_FILE, RC_FILE] {
            let path = dir.join(name);
            if path.exists() {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ORG_PROVISION")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// A zero interval would re-poll without pausing, so it falls back to the default.
    pub fn poll_config(&self) -> PollConfig {
        let interval = match self.polling.interval_ms {
            0 => {
                tracing::warn!("polling.interval_ms must be positive, using the default");
                DEFAULT_POLL_INTERVAL
            }
            ms => Duration::from_millis(ms),
        };
        PollConfig {
            interval,
            max_attempts: self.polling.max_attempts,
            max_transient_errors: self.polling.max_transient_errors,
        }
    }
}
