use anyhow::{Context, Result};
use std::env;

use crate::models::MigrationMode;

/// Config holds all migration run configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub testbed_file: String,
    pub templates_dir: String,
    pub backup_dir: String,
    pub pre_dir: String,
    pub post_dir: String,
    pub changelog_dir: String,
    pub data_vlan_name: String,
    pub mode: MigrationMode,
    pub ssh_timeout: u64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. Invalid mode or timeout values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_env = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let mode = get_env("C3PL_MODE", "enforcement");
        let mode: MigrationMode = mode
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid C3PL_MODE '{}': {}", mode, e))?;

        let ssh_timeout = get_env("C3PL_SSH_TIMEOUT", "30");
        let ssh_timeout: u64 = ssh_timeout
            .trim()
            .parse()
            .with_context(|| format!("Invalid C3PL_SSH_TIMEOUT '{}'", ssh_timeout))?;
        if ssh_timeout == 0 {
            anyhow::bail!("C3PL_SSH_TIMEOUT must be at least 1 second");
        }

        Ok(Self {
            testbed_file: get_env("C3PL_TESTBED", "testbeds/testbed_sample.yml"),
            templates_dir: get_env("C3PL_TEMPLATES_DIR", "templates"),
            backup_dir: get_env("C3PL_BACKUP_DIR", "backup_configs"),
            pre_dir: get_env("C3PL_PRE_DIR", "pre_configs"),
            post_dir: get_env("C3PL_POST_DIR", "post_configs"),
            changelog_dir: get_env("C3PL_CHANGELOG_DIR", "changelog"),
            data_vlan_name: get_env("C3PL_DATA_VLAN_NAME", "data_vlan"),
            mode,
            ssh_timeout,
        })
    }

    /// Apply command-line overrides on top of the environment
    pub fn with_overrides(mut self, args: &crate::Args) -> Self {
        if let Some(path) = &args.testbed_file {
            self.testbed_file = path.clone();
        }
        if let Some(dir) = &args.templates_dir {
            self.templates_dir = dir.clone();
        }
        if let Some(name) = &args.data_vlan_name {
            self.data_vlan_name = name.clone();
        }
        if let Some(mode) = args.mode {
            self.mode = mode;
        }
        if let Some(timeout) = args.ssh_timeout {
            self.ssh_timeout = timeout;
        }
        self
    }
}
