//! Configuration resolution.
//!
//! Values come from, in order of precedence: command-line flags, environment
//! variables, an optional YAML config file, and built-in defaults. The token
//! is never read from the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{FanoutError, Result};
use crate::github::{Credential, DEFAULT_API_URL, DEFAULT_TIMEOUT, GitHubClient};
use crate::types::DEFAULT_BASE_BRANCH;

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const OWNER_ENV: &str = "GITHUB_OWNER";
pub const API_URL_ENV: &str = "GH_FANOUT_API_URL";
pub const CONFIG_ENV: &str = "GH_FANOUT_CONFIG";

/// Contents of `config.yaml`. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub owner: Option<String>,
    pub base_branch: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub rollback: Option<bool>,
}

impl FileConfig {
    /// `<config dir>/gh-fanout/config.yaml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gh-fanout").join("config.yaml"))
    }

    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load an explicitly named file, or the default file when it exists.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(FanoutError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}

/// Values supplied on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub token: Option<String>,
    pub owner: Option<String>,
    pub api_url: Option<String>,
    pub base_branch: Option<String>,
    pub timeout_secs: Option<u64>,
    pub rollback: Option<bool>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credential: Credential,
    pub api_url: String,
    pub timeout: Duration,
    pub base_branch: String,
    pub rollback: bool,
}

impl Settings {
    /// Resolve settings from flags, the process environment and `file`.
    pub fn from_env(overrides: &Overrides, file: &FileConfig) -> Result<Self> {
        Self::resolve(overrides, |key| std::env::var(key).ok(), file)
    }

    /// Resolve settings with an injectable environment lookup.
    pub fn resolve<F>(overrides: &Overrides, env: F, file: &FileConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let token = overrides
            .token
            .clone()
            .or_else(|| env(TOKEN_ENV))
            .ok_or_else(|| FanoutError::Config(format!("{} is not set", TOKEN_ENV)))?;

        let owner = overrides
            .owner
            .clone()
            .or_else(|| env(OWNER_ENV))
            .or_else(|| file.owner.clone())
            .ok_or_else(|| {
                FanoutError::Config(format!(
                    "{} is not set (pass --owner or set 'owner' in the config file)",
                    OWNER_ENV
                ))
            })?;

        let api_url = overrides
            .api_url
            .clone()
            .or_else(|| env(API_URL_ENV))
            .or_else(|| file.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.into());

        let timeout = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(FanoutError::Config("timeout must be at least one second".into()));
        }

        let base_branch = overrides
            .base_branch
            .clone()
            .or_else(|| file.base_branch.clone())
            .unwrap_or_else(|| DEFAULT_BASE_BRANCH.into());

        let rollback = overrides.rollback.or(file.rollback).unwrap_or(false);

        Ok(Self {
            credential: Credential::new(token, owner)?,
            api_url,
            timeout,
            base_branch,
            rollback,
        })
    }

    /// Build the API client these settings describe.
    pub fn client(&self) -> Result<GitHubClient> {
        GitHubClient::builder(self.credential.clone())
            .base_url(&self.api_url)
            .timeout(self.timeout)
            .build()
    }
}
