//! Configuration management for content-dispatch
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer defaults, a `content-dispatch.toml` file,
//! environment variables and command-line arguments.

use crate::cli::Cli;
use crate::error::DispatchError;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The file read when no `--config` path is given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "content-dispatch.toml";

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

pub const DEFAULT_USER_AGENT: &str = concat!("content-dispatch/", env!("CARGO_PKG_VERSION"));

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Where dispatch events are sent.
    pub github: GitHubConfig,
    /// How dispatches are sent and drained.
    pub dispatch: DispatchConfig,
}

/// Repository-dispatch target settings.
///
/// Owner, repo and token default to empty; an empty value is reported at
/// dispatch time rather than failing the load.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub api_base_url: String,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            token: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Dispatch transport and shutdown settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Per-request timeout. `None` leaves the HTTP client's default in place.
    pub timeout_seconds: Option<u64>,
    /// How long shutdown waits for in-flight dispatches before abandoning them.
    pub drain_timeout_seconds: u64,
    /// Reload the configuration file when it changes on disk.
    pub watch_config: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: None,
            drain_timeout_seconds: 5,
            watch_config: false,
        }
    }
}

impl DispatchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_seconds)
    }
}

/// The resolved destination of one dispatch batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTarget {
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub api_base_url: String,
    pub user_agent: String,
}

impl DispatchTarget {
    /// `{api_base_url}/repos/{owner}/{repo}/dispatches`
    ///
    /// Owner and repo are percent-encoded as single path segments, so a `/`,
    /// `?` or `#` in either cannot change the request target.
    pub fn dispatch_url(&self) -> Result<Url, DispatchError> {
        let invalid = |reason: String| {
            DispatchError::InvalidUrl(format!("{}: {reason}", self.api_base_url))
        };
        let mut url = Url::parse(&self.api_base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.repo.as_str(), "dispatches"]);
        Ok(url)
    }
}

impl GitHubConfig {
    /// Resolves the dispatch target, failing if owner, repo or token is blank.
    pub fn target(&self) -> Result<DispatchTarget, DispatchError> {
        let fields: Vec<&'static str> = [
            ("owner", &self.owner),
            ("repo", &self.repo),
            ("token", &self.token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !fields.is_empty() {
            return Err(DispatchError::ConfigMissing { fields });
        }

        Ok(DispatchTarget {
            owner: self.owner.trim().to_string(),
            repo: self.repo.trim().to_string(),
            token: self.token.trim().to_string(),
            api_base_url: self.api_base_url.clone(),
            user_agent: self.user_agent.clone(),
        })
    }
}

impl Config {
    /// Builds the layered figment for a config file, without CLI overrides.
    ///
    /// Environment variables use a double underscore for nesting, e.g.
    /// `CONTENT_DISPATCH_GITHUB__TOKEN`.
    pub fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("CONTENT_DISPATCH_").split("__"))
    }

    /// Loads the configuration from the file named on the command line (or
    /// the default file), environment variables and CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = Self::resolve_path(cli.config.as_deref())?;
        let config: Config = Self::figment(&path).merge(cli.clone()).extract()?;
        Ok(config)
    }

    /// Loads the configuration from a file and the environment only.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config: Config = Self::figment(path).extract()?;
        Ok(config)
    }

    /// The config file to read. An explicit path must exist.
    pub fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) if !path.exists() => {
                bail!("Config file not found at specified path: {}", path.display())
            }
            Some(path) => Ok(path.to_path_buf()),
            None => Ok(PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            github: GitHubConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}
