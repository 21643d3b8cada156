//! Node configuration loaded from YAML with environment overrides

use anyhow::{bail, Context, Result};
use discovery_core::datasources::decode;
use discovery_core::{BroadcastConfig, DatasourceSet};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the YAML config file
pub const CONFIG_FILE_ENV: &str = "NODE_ANNOUNCER_CONFIG";

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration of the node announcer
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Unique id of this node
    pub node_id: String,

    /// Deployment environment
    pub environment: String,

    /// Optional node location
    pub location: Option<String>,

    /// Version advertised in the announcement
    pub node_version: String,

    /// HTTP URI advertised in the announcement
    pub http_uri: String,

    /// Whether this node is a coordinator
    pub coordinator: bool,

    /// Whether a coordinator is also scheduled for query execution
    pub include_coordinator: bool,

    /// Explicit comma-delimited datasource list
    pub datasources: Option<String>,

    /// Catalogs available at startup
    pub catalogs: Vec<String>,

    /// Seconds between periodic announcements
    pub announce_interval_secs: u64,

    /// Seconds before retrying a failed announcement
    pub retry_delay_secs: u64,

    /// Admin HTTP listen address
    pub admin_addr: SocketAddr,

    pub log_format: LogFormat,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: uuid::Uuid::new_v4().to_string(),
            environment: "production".to_string(),
            location: None,
            node_version: env!("CARGO_PKG_VERSION").to_string(),
            http_uri: "http://127.0.0.1:8080".to_string(),
            coordinator: false,
            include_coordinator: true,
            datasources: None,
            catalogs: Vec::new(),
            announce_interval_secs: 8,
            retry_delay_secs: 5,
            admin_addr: ([0, 0, 0, 0], 8081).into(),
            log_format: LogFormat::Text,
        }
    }
}

impl NodeConfig {
    /// Load configuration.
    ///
    /// Priority: YAML file named by `NODE_ANNOUNCER_CONFIG` (or defaults),
    /// then environment variables.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the broadcaster spin
    pub fn validate(&self) -> Result<()> {
        if self.announce_interval_secs == 0 {
            bail!("announce_interval_secs must be at least 1");
        }
        if self.retry_delay_secs == 0 {
            bail!("retry_delay_secs must be at least 1");
        }
        Ok(())
    }

    /// Apply overrides looked up by environment variable name.
    ///
    /// Variables:
    /// - `NODE_ID`, `NODE_ENVIRONMENT`, `NODE_LOCATION`
    /// - `NODE_COORDINATOR`, `NODE_INCLUDE_COORDINATOR`: `true` or `false`
    /// - `NODE_DATASOURCES`: comma-delimited datasource list
    /// - `NODE_CATALOGS`: comma-delimited catalog names
    /// - `ADMIN_ADDR`: admin listen address
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(node_id) = lookup("NODE_ID") {
            self.node_id = node_id;
        }
        if let Some(environment) = lookup("NODE_ENVIRONMENT") {
            self.environment = environment;
        }
        if let Some(location) = lookup("NODE_LOCATION") {
            self.location = Some(location);
        }
        if let Some(coordinator) = lookup("NODE_COORDINATOR") {
            self.coordinator = coordinator
                .parse()
                .with_context(|| format!("Invalid NODE_COORDINATOR: {}", coordinator))?;
        }
        if let Some(include) = lookup("NODE_INCLUDE_COORDINATOR") {
            self.include_coordinator = include
                .parse()
                .with_context(|| format!("Invalid NODE_INCLUDE_COORDINATOR: {}", include))?;
        }
        if let Some(datasources) = lookup("NODE_DATASOURCES") {
            self.datasources = Some(datasources);
        }
        if let Some(catalogs) = lookup("NODE_CATALOGS") {
            self.catalogs = decode(Some(catalogs.as_str())).iter().map(str::to_string).collect();
        }
        if let Some(addr) = lookup("ADMIN_ADDR") {
            self.admin_addr = addr
                .parse()
                .with_context(|| format!("Invalid ADMIN_ADDR: {}", addr))?;
        }
        Ok(())
    }

    /// Explicitly configured datasources, empty when none are set
    pub fn configured_datasources(&self) -> DatasourceSet {
        decode(self.datasources.as_deref())
    }

    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            node_id: self.node_id.clone(),
            environment: self.environment.clone(),
            location: self.location.clone(),
            interval: Duration::from_secs(self.announce_interval_secs),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
        }
    }
}
