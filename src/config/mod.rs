use std::time::Duration;

use serde::Deserialize;

use crate::records::SnapshotKind;

pub mod loader;
pub mod validator;

pub use loader::{expand_env_vars, load_config, DEFAULT_CONFIG_PATH};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub exchange: ExchangeConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub markets: MarketFilter,
    #[serde(default = "default_pipelines")]
    pub pipelines: Vec<PipelineConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ExchangeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Narrows the exchange listing down to the markets that get polled.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketFilter {
    #[serde(default = "default_true")]
    pub only_active: bool,
    #[serde(default)]
    pub include: Vec<String>,
}

impl Default for MarketFilter {
    fn default() -> Self {
        Self {
            only_active: true,
            include: Vec::new(),
        }
    }
}

/// Upper bound on a pipeline's concurrency budget.
pub const MAX_CONCURRENCY: usize = 256;

/// Cadence and concurrency budget for one snapshot kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineConfig {
    pub kind: SnapshotKind,
    pub interval_ms: u64,
    pub concurrency: usize,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl PipelineConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Cadences observed against the public API; order books are hot, trades are slow.
    pub fn defaults_for(kind: SnapshotKind) -> Self {
        let (interval_ms, concurrency) = match kind {
            SnapshotKind::OrderBook => (1_000, 15),
            SnapshotKind::TradeHistory => (90_000, 15),
            SnapshotKind::MarketSummaries => (60_000, 1),
            SnapshotKind::Ticker => (30_000, 10),
        };
        Self {
            kind,
            interval_ms,
            concurrency,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn enabled_pipelines(&self) -> impl Iterator<Item = &PipelineConfig> {
        self.pipelines.iter().filter(|pipeline| pipeline.enabled)
    }
}

fn default_pipelines() -> Vec<PipelineConfig> {
    SnapshotKind::ALL
        .iter()
        .copied()
        .map(PipelineConfig::defaults_for)
        .collect()
}

fn default_connect_timeout_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    90
}

fn default_max_connections() -> u32 {
    20
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
