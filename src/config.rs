//! Configuration file handling.
//!
//! Config lives at `~/.opsrun/config.yaml` (override the path with the
//! `OPSRUN_CONFIG` env var). A missing file means defaults; a present but
//! unparsable file is an error, never a silent fallback.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// Retry settings as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub cap_ms: Option<u64>,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            multiplier: 2.0,
            cap_ms: None,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Build the runtime policy this config describes.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        let mut policy = RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
        )
        .multiplier(self.multiplier)
        .jitter(self.jitter);
        if let Some(cap_ms) = self.cap_ms {
            policy = policy.cap(Duration::from_millis(cap_ms));
        }
        policy
    }
}

/// Top-level opsrun configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default timeout applied to every invocation, in seconds.
    pub timeout_secs: u64,
    pub retry: RetryConfig,
    /// Terraform project directory.
    pub terraform_dir: PathBuf,
    /// Default ansible inventory file.
    pub inventory: Option<String>,
    /// Webhook URL for `opsrun notify`.
    pub webhook_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            retry: RetryConfig::default(),
            terraform_dir: PathBuf::from("."),
            inventory: None,
            webhook_url: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// YAML-file-backed config store.
pub struct ConfigStore;

impl ConfigStore {
    /// Resolve the config file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn path() -> Result<PathBuf> {
        if let Ok(val) = std::env::var("OPSRUN_CONFIG") {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".opsrun").join("config.yaml"))
    }

    /// Load the config, defaulting when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Config> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path (tests inject a tempdir path here).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    /// Save the config to the resolved path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(config: &Config) -> Result<()> {
        Self::save_to(&Self::path()?, config)
    }

    /// Save to an explicit path with mode 600 (the file may hold a webhook
    /// URL with an embedded secret).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save_to(path: &Path, config: &Config) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let content = serde_yaml::to_string(config).context("cannot serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("cannot write {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("cannot set permissions on {}", path.display()))?;
        }
        Ok(())
    }
}
