//! Configuration Module - TOML-based Daemon Configuration
//!
//! Loads and validates configuration from `config.toml`. All chain
//! endpoints and monitor timings are externalized here - nothing is
//! hardcoded in the domain layer beyond the builtin chain catalog,
//! which config may override per chain.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

use crate::adapters::rpc::HttpRpcConfig;
use crate::domain::chain::{ChainDescriptor, ProviderKind};
use crate::domain::transaction::MonitorOptions;

/// Top-level daemon configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated
/// before the daemon begins operation.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  /// Daemon identity and metadata.
  pub app: AppSection,
  /// Network monitor timing.
  pub network: NetworkSection,
  /// Transaction monitor defaults.
  pub transactions: TransactionSection,
  /// JSON-RPC HTTP client tuning.
  pub rpc: RpcSection,
  /// Metrics and monitoring.
  pub metrics: MetricsConfig,
  /// Persistence configuration.
  pub persistence: PersistenceConfig,
  /// Per-chain overrides applied to the builtin catalog.
  #[serde(default)]
  pub chains: Vec<ChainOverride>,
  /// Unattended wallet providers to register.
  #[serde(default)]
  pub providers: Vec<ProviderConfig>,
  /// Sessions to open once providers are registered.
  #[serde(default)]
  pub sessions: Vec<SessionConfig>,
}

/// Daemon identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
  /// Human-readable daemon name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  #[serde(default = "default_log_level")]
  pub log_level: String,
}

/// Network monitor timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSection {
  /// Seconds between health probes per chain.
  #[serde(default = "default_network_poll")]
  pub poll_interval_seconds: u64,
  /// Seconds before a single probe is declared dead.
  #[serde(default = "default_probe_timeout")]
  pub probe_timeout_seconds: u64,
}

impl NetworkSection {
  /// Probe cadence as a `Duration`.
  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_seconds)
  }

  /// Per-probe deadline as a `Duration`.
  pub fn probe_timeout(&self) -> Duration {
    Duration::from_secs(self.probe_timeout_seconds)
  }
}

/// Transaction monitor default configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionSection {
  /// Confirmations required before a transaction is final.
  #[serde(default = "default_confirmations")]
  pub required_confirmations: u64,
  /// Seconds before an unmined transaction is declared dropped.
  #[serde(default = "default_tx_timeout")]
  pub timeout_seconds: u64,
  /// Seconds between receipt polls per transaction.
  #[serde(default = "default_tx_poll")]
  pub poll_interval_seconds: u64,
}

impl TransactionSection {
  /// Monitor defaults as domain options.
  pub fn monitor_options(&self) -> MonitorOptions {
    MonitorOptions {
      required_confirmations: self.required_confirmations,
      timeout: Duration::from_secs(self.timeout_seconds),
      poll_interval: Duration::from_secs(self.poll_interval_seconds),
    }
  }
}

/// JSON-RPC HTTP client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcSection {
  /// Request timeout in seconds.
  #[serde(default = "default_rpc_timeout")]
  pub timeout_seconds: u64,
  /// Idle connections kept per endpoint.
  #[serde(default = "default_pool_max_idle")]
  pub pool_max_idle: usize,
}

impl RpcSection {
  /// Client settings as adapter configuration.
  pub fn http_config(&self) -> HttpRpcConfig {
    HttpRpcConfig {
      timeout: Duration::from_secs(self.timeout_seconds),
      pool_max_idle: self.pool_max_idle,
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  #[serde(default = "default_true")]
  pub enabled: bool,
  /// Metrics server bind address.
  #[serde(default = "default_metrics_addr")]
  pub bind_address: String,
  /// Health check endpoint port.
  #[serde(default = "default_health_port")]
  pub health_port: u16,
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
  /// Directory for the session store.
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
}

/// Per-chain override of builtin catalog endpoints.
///
/// Endpoints live in config so deployments can point at their own
/// RPC infrastructure without touching the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainOverride {
  /// Catalog id of the chain to override.
  pub id: String,
  /// Replacement JSON-RPC endpoint.
  pub rpc_url: Option<String>,
  /// Replacement explorer base URL.
  pub explorer_url: Option<String>,
}

impl ChainOverride {
  /// Apply this override to a catalog entry in place.
  pub fn apply(&self, chain: &mut ChainDescriptor) {
    if let Some(url) = &self.rpc_url {
      chain.rpc_url = url.clone();
    }
    if let Some(url) = &self.explorer_url {
      chain.explorer_url = url.clone();
    }
  }
}

/// Unattended wallet provider registration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
  /// Provider slot this registration fills.
  pub kind: ProviderKind,
  /// Accounts the provider exposes.
  pub accounts: Vec<String>,
  /// Chains the provider already knows.
  #[serde(default)]
  pub known_chains: Vec<String>,
}

/// Session to open at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
  /// Chain to connect.
  pub chain: String,
  /// Provider to connect through.
  pub provider: ProviderKind,
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

fn default_network_poll() -> u64 {
  10
}

fn default_probe_timeout() -> u64 {
  5
}

fn default_confirmations() -> u64 {
  1
}

fn default_tx_timeout() -> u64 {
  300
}

fn default_tx_poll() -> u64 {
  3
}

fn default_rpc_timeout() -> u64 {
  10
}

fn default_pool_max_idle() -> usize {
  5
}

fn default_metrics_addr() -> String {
  "0.0.0.0:9090".to_string()
}

fn default_health_port() -> u16 {
  8080
}

fn default_data_dir() -> String {
  "data".to_string()
}
