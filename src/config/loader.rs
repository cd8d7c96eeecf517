//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;
use crate::domain::chain::ChainRegistry;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  let config: AppConfig = toml::from_str(&content)
    .with_context(|| "Failed to parse config.toml")?;

  validate_config(&config)?;

  info!(
    chain_overrides = config.chains.len(),
    providers = config.providers.len(),
    sessions = config.sessions.len(),
    "Configuration loaded successfully"
  );

  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Positive monitor timings
/// - Chain overrides that resolve in the builtin catalog
/// - Provider registrations without duplicates
/// - Startup sessions that reference configured providers
fn validate_config(config: &AppConfig) -> Result<()> {
  let catalog = ChainRegistry::builtin();

  // Identity validation
  anyhow::ensure!(!config.app.name.is_empty(), "app.name must not be empty");
  anyhow::ensure!(
    matches!(
      config.app.log_level.as_str(),
      "trace" | "debug" | "info" | "warn" | "error"
    ),
    "app.log_level must be one of trace/debug/info/warn/error, got {}",
    config.app.log_level
  );

  // Network monitor validation
  anyhow::ensure!(
    config.network.poll_interval_seconds > 0,
    "network.poll_interval_seconds must be positive"
  );
  anyhow::ensure!(
    config.network.probe_timeout_seconds > 0,
    "network.probe_timeout_seconds must be positive"
  );
  anyhow::ensure!(
    config.network.probe_timeout_seconds <= config.network.poll_interval_seconds,
    "network.probe_timeout_seconds ({}) must not exceed poll_interval_seconds ({})",
    config.network.probe_timeout_seconds,
    config.network.poll_interval_seconds
  );

  // Transaction monitor validation
  anyhow::ensure!(
    config.transactions.required_confirmations >= 1,
    "transactions.required_confirmations must be at least 1, got {}",
    config.transactions.required_confirmations
  );
  anyhow::ensure!(
    config.transactions.poll_interval_seconds > 0,
    "transactions.poll_interval_seconds must be positive"
  );
  anyhow::ensure!(
    config.transactions.poll_interval_seconds < config.transactions.timeout_seconds,
    "transactions.poll_interval_seconds ({}) must be below timeout_seconds ({})",
    config.transactions.poll_interval_seconds,
    config.transactions.timeout_seconds
  );

  // RPC client validation
  anyhow::ensure!(
    config.rpc.timeout_seconds > 0,
    "rpc.timeout_seconds must be positive"
  );

  // Chain override validation
  for (i, chain) in config.chains.iter().enumerate() {
    anyhow::ensure!(
      catalog.lookup(&chain.id).is_some(),
      "Chain override {} references unknown chain: {}",
      i,
      chain.id
    );
    if let Some(url) = &chain.rpc_url {
      anyhow::ensure!(
        !url.is_empty(),
        "Chain override {} ({}) has empty rpc_url",
        i,
        chain.id
      );
    }
    if let Some(url) = &chain.explorer_url {
      anyhow::ensure!(
        !url.is_empty(),
        "Chain override {} ({}) has empty explorer_url",
        i,
        chain.id
      );
    }
  }

  // Provider validation
  for (i, provider) in config.providers.iter().enumerate() {
    let dupes = config.providers[..i]
      .iter()
      .filter(|p| p.kind == provider.kind)
      .count();
    anyhow::ensure!(
      dupes == 0,
      "Provider {} registered more than once",
      provider.kind
    );
  }

  // Startup session validation
  for (i, session) in config.sessions.iter().enumerate() {
    anyhow::ensure!(
      catalog.lookup(&session.chain).is_some(),
      "Session {} references unknown chain: {}",
      i,
      session.chain
    );
    anyhow::ensure!(
      config.providers.iter().any(|p| p.kind == session.provider),
      "Session {} ({}) references unregistered provider {}",
      i,
      session.chain,
      session.provider
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  const MINIMAL: &str = r#"
[app]
name = "wallet-core"

[network]
[transactions]
[rpc]
[metrics]
[persistence]
"#;

  fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
  }

  #[test]
  fn test_load_nonexistent_file() {
    let result = load_config("nonexistent.toml");
    assert!(result.is_err());
  }

  #[test]
  fn test_minimal_config_gets_defaults() {
    let file = write_config(MINIMAL);
    let config = load_config(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.app.log_level, "info");
    assert_eq!(config.network.poll_interval_seconds, 10);
    assert_eq!(config.transactions.required_confirmations, 1);
    assert_eq!(config.persistence.data_dir, "data");
    assert!(config.sessions.is_empty());
  }

  #[test]
  fn test_zero_poll_interval_rejected() {
    let file = write_config(
      r#"
[app]
name = "wallet-core"

[network]
poll_interval_seconds = 0

[transactions]
[rpc]
[metrics]
[persistence]
"#,
    );
    let err = load_config(file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("poll_interval_seconds"));
  }

  #[test]
  fn test_unknown_chain_override_rejected() {
    let file = write_config(
      r#"
[app]
name = "wallet-core"

[network]
[transactions]
[rpc]
[metrics]
[persistence]

[[chains]]
id = "dogechain"
rpc_url = "https://rpc.example.org"
"#,
    );
    let err = load_config(file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("dogechain"));
  }

  #[test]
  fn test_session_requires_registered_provider() {
    let file = write_config(
      r#"
[app]
name = "wallet-core"

[network]
[transactions]
[rpc]
[metrics]
[persistence]

[[sessions]]
chain = "ethereum"
provider = "metamask"
"#,
    );
    let err = load_config(file.path().to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("unregistered provider"));
  }
}
