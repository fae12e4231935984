//! Configuration loading
//!
//! Handles:
//! - Node identity stamped on reports
//! - The `enable_usage_stats` opt-in and reporting endpoint
//! - Admin API addresses and timeouts
//!
//! The file is TOML and read-only from rpk-agent's point of view; a missing
//! file yields defaults with reporting disabled.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::payload::NodeIdentity;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_VAR: &str = "RPK_AGENT_CONFIG";

pub const DEFAULT_REPORTING_URL: &str = "https://m.rp.vectorized.io";
pub const DEFAULT_ADMIN_ADDRESS: &str = "127.0.0.1:9644";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub node: NodeConfig,
    pub rpk: RpkConfig,
    pub reporting: ReportingSection,
    pub admin_api: AdminSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node_id: i64,
    pub node_uuid: String,
    /// Redpanda version reported in environment payloads
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RpkConfig {
    pub enable_usage_stats: bool,
    pub organization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingSection {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSection {
    pub addresses: Vec<String>,
    pub timeout_secs: u64,
}

/// Everything `UsageReporter` needs, passed by value at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingConfig {
    pub enable_usage_stats: bool,
    pub url: String,
    pub timeout: Duration,
}

/// Everything `AdminClient` needs, passed by value at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub addresses: Vec<String>,
    pub timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: 0,
            node_uuid: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ReportingSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_REPORTING_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            addresses: vec![DEFAULT_ADMIN_ADDRESS.to_string()],
            timeout_secs: 10,
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        AgentConfig::default().reporting_config()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        AgentConfig::default().admin_config()
    }
}

impl AgentConfig {
    /// Load from `explicit`, else `$RPK_AGENT_CONFIG`, else the OS config dir
    pub async fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os(CONFIG_PATH_VAR) {
                Some(path) => PathBuf::from(path),
                None => Self::config_file_path()?,
            },
        };
        Self::load_from(&path).await
    }

    /// Load a specific file; a missing file yields defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AgentConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Get OS-specific config file path
    pub fn config_file_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        path.push("rpk-agent");
        path.push("config.toml");
        Ok(path)
    }

    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity {
            node_uuid: self.node.node_uuid.clone(),
            node_id: self.node.node_id,
            organization: self.rpk.organization.clone(),
        }
    }

    pub fn reporting_config(&self) -> ReportingConfig {
        ReportingConfig {
            enable_usage_stats: self.rpk.enable_usage_stats,
            url: self.reporting.url.clone(),
            timeout: Duration::from_secs(self.reporting.timeout_secs),
        }
    }

    pub fn admin_config(&self) -> AdminConfig {
        AdminConfig {
            addresses: self.admin_api.addresses.clone(),
            timeout: Duration::from_secs(self.admin_api.timeout_secs),
        }
    }
}
