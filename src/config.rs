use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub console: ConsoleConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default = "default_metric_groups")]
    pub metric_groups: Vec<MetricGroupDefinition>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleConfig {
    pub host: String,
    #[serde(default = "default_console_port")]
    pub port: u16,
    pub userid: String,
    pub password: SecretString,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval_seconds: u64,
    #[serde(default = "default_auto_update_interval")]
    pub auto_update_interval_seconds: u64,
    /// CPC names to export; empty means every CPC the console lists.
    #[serde(default)]
    pub target_cpcs: Vec<String>,
    /// Metric group names to export; empty means every defined group.
    #[serde(default)]
    pub enabled_metric_groups: Vec<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            scrape_interval_seconds: default_scrape_interval(),
            auto_update_interval_seconds: default_auto_update_interval(),
            target_cpcs: Vec::new(),
            enabled_metric_groups: Vec::new(),
        }
    }
}

/// Where the values of a metric group come from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricGroupKind {
    /// Streamed by the console metrics service.
    Metric,
    /// Read directly from resource properties.
    Resource,
}

/// Metric group metadata: which resource class a group reports on.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MetricGroupDefinition {
    pub name: String,
    pub kind: MetricGroupKind,
    /// Resource class name, e.g. `partition` or `storage-volume`.
    pub resource: String,
}

impl MetricGroupDefinition {
    pub fn new(name: &str, kind: MetricGroupKind, resource: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            resource: resource.to_string(),
        }
    }
}

fn default_console_port() -> u16 {
    6794
}

fn default_verify_ssl() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9291
}

fn default_namespace() -> String {
    "zhmc".to_string()
}

fn default_scrape_interval() -> u64 {
    60
}

fn default_auto_update_interval() -> u64 {
    30
}

/// Built-in metric group catalogue used when the config defines none.
pub fn default_metric_groups() -> Vec<MetricGroupDefinition> {
    use MetricGroupKind::{Metric, Resource};
    vec![
        MetricGroupDefinition::new("cpc-usage-overview", Metric, "cpc"),
        MetricGroupDefinition::new("logical-partition-usage", Metric, "logical-partition"),
        MetricGroupDefinition::new("partition-usage", Metric, "partition"),
        MetricGroupDefinition::new("adapter-usage", Metric, "adapter"),
        MetricGroupDefinition::new("network-physical-adapter-port", Metric, "adapter"),
        MetricGroupDefinition::new("partition-attached-network-interface", Metric, "nic"),
        MetricGroupDefinition::new("cpc-resource", Resource, "cpc"),
        MetricGroupDefinition::new("partition-resource", Resource, "partition"),
        MetricGroupDefinition::new("logical-partition-resource", Resource, "logical-partition"),
        MetricGroupDefinition::new("storagegroup-resource", Resource, "storage-group"),
        MetricGroupDefinition::new("storagevolume-resource", Resource, "storage-volume"),
        MetricGroupDefinition::new("adapter-resource", Resource, "adapter"),
        MetricGroupDefinition::new("nic-resource", Resource, "nic"),
    ]
}

/// Command-line values that take precedence over the loaded configuration.
/// Fields left `None` keep whatever the file or environment set.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub host: Option<String>,
    pub userid: Option<String>,
    pub password: Option<SecretString>,
    pub port: Option<u16>,
    pub addr: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("HMC_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(host) = overrides.host {
            self.console.host = host;
        }
        if let Some(userid) = overrides.userid {
            self.console.userid = userid;
        }
        if let Some(password) = overrides.password {
            self.console.password = password;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(addr) = overrides.addr {
            self.server.addr = addr;
        }
    }

    /// The metric groups selected for export.
    pub fn enabled_metric_groups(&self) -> Vec<MetricGroupDefinition> {
        let selected = &self.metrics.enabled_metric_groups;
        self.metric_groups
            .iter()
            .filter(|group| selected.is_empty() || selected.contains(&group.name))
            .cloned()
            .collect()
    }
}
