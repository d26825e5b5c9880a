//! Process configuration
//!
//! Loaded once from `~/.microseg/config.toml` (or an explicit path). The
//! binary layers environment variables and flags over it before use.

use microseg_apic::SharedResourceOverrides;
use microseg_appd::{DEFAULT_RELATIONSHIPS_FILE, DEFAULT_TIER_MAP_FILE};
use microseg_common::{MicrosegError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MicrosegConfig {
    pub controller: ControllerConfig,
    pub topology: TopologyConfig,
    /// Skip discovery for any shared resource set here
    pub shared: SharedResourceOverrides,
    /// Treat one-sided contracts as errors
    pub strict_symmetry: bool,
}

/// APIC connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub url: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub verify_tls: bool,
    pub timeout_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            url: None,
            login: None,
            password: None,
            verify_tls: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// AppDynamics connection and topology files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub url: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    pub tier_map_path: PathBuf,
    pub relationships_path: PathBuf,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            url: None,
            login: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            tier_map_path: PathBuf::from(DEFAULT_TIER_MAP_FILE),
            relationships_path: PathBuf::from(DEFAULT_RELATIONSHIPS_FILE),
        }
    }
}

/// Validated controller credentials
#[derive(Debug, Clone)]
pub struct Credentials<'a> {
    pub url: &'a str,
    pub login: &'a str,
    pub password: &'a str,
}

fn required<'a>(value: &'a Option<String>, what: &str, env: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MicrosegError::config(format!("{what} is not set (use {env})"))),
    }
}

impl MicrosegConfig {
    /// Load from `path`, or from the default location if none is given
    ///
    /// A missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = Self::default_path()?;
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = fs::read_to_string(&path)
            .map_err(|e| MicrosegError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| MicrosegError::config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| MicrosegError::config("cannot find home directory"))?;
        Ok(home.join(".microseg").join("config.toml"))
    }

    pub fn controller_credentials(&self) -> Result<Credentials<'_>> {
        Ok(Credentials {
            url: required(&self.controller.url, "controller URL", "APIC_URL")?,
            login: required(&self.controller.login, "controller login", "APIC_LOGIN")?,
            password: required(&self.controller.password, "controller password", "APIC_PASSWORD")?,
        })
    }

    pub fn topology_credentials(&self) -> Result<Credentials<'_>> {
        Ok(Credentials {
            url: required(&self.topology.url, "AppDynamics URL", "APPD_URL")?,
            login: required(&self.topology.login, "AppDynamics login", "APPD_LOGIN")?,
            password: required(&self.topology.password, "AppDynamics password", "APPD_PASSWORD")?,
        })
    }

    pub fn controller_timeout(&self) -> Duration {
        Duration::from_secs(self.controller.timeout_secs)
    }

    pub fn topology_timeout(&self) -> Duration {
        Duration::from_secs(self.topology.timeout_secs)
    }
}
