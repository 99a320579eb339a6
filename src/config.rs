use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::aggregator::{AggregateOptions, ColumnPolicy};
use crate::backends::BackendClientConfig;
use crate::models::{ApiKind, BackendInstance};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Monitoring instances, queried in this order.
    #[serde(default)]
    pub backends: Vec<BackendInstance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregationConfig {
    #[serde(
        default = "default_api_kind",
        deserialize_with = "deserialize_api_kind"
    )]
    pub api_kind: ApiKind,
    #[serde(default)]
    pub column_policy: ColumnPolicy,
    /// Max backend queries in flight per page load. 1 keeps them strictly sequential.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            api_kind: default_api_kind(),
            column_policy: ColumnPolicy::default(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_kind() -> ApiKind {
    ApiKind::NagiosApi
}

fn default_max_concurrent_fetches() -> usize {
    1
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn deserialize_api_kind<'de, D: Deserializer<'de>>(d: D) -> Result<ApiKind, D::Error> {
    let s = String::deserialize(d)?;
    s.parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Browser refresh interval for the HTML page; 0 disables it.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

fn default_title() -> String {
    "Status board".into()
}

fn default_refresh_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.backends.is_empty(),
            "at least one [[backends]] entry is required"
        );
        for (i, b) in self.backends.iter().enumerate() {
            anyhow::ensure!(
                !b.hostname.trim().is_empty(),
                "backends[{}].hostname must be non-empty",
                i
            );
            anyhow::ensure!(
                b.port > 0,
                "backends[{}].port must be between 1 and 65535, got {}",
                i,
                b.port
            );
            anyhow::ensure!(
                !b.tag.trim().is_empty(),
                "backends[{}].tag must be non-empty",
                i
            );
        }
        anyhow::ensure!(
            self.aggregation.max_concurrent_fetches > 0,
            "aggregation.max_concurrent_fetches must be > 0, got {}",
            self.aggregation.max_concurrent_fetches
        );
        anyhow::ensure!(
            self.aggregation.request_timeout_secs > 0,
            "aggregation.request_timeout_secs must be > 0, got {}",
            self.aggregation.request_timeout_secs
        );
        Ok(())
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            column_policy: self.aggregation.column_policy,
            max_concurrent_fetches: self.aggregation.max_concurrent_fetches,
        }
    }

    pub fn client_config(&self) -> BackendClientConfig {
        BackendClientConfig {
            request_timeout: Duration::from_secs(self.aggregation.request_timeout_secs),
        }
    }

    pub fn known_tags(&self) -> BTreeSet<String> {
        self.backends.iter().map(|b| b.tag.clone()).collect()
    }
}
