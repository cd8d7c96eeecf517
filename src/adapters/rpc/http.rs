//! HTTP JSON-RPC Client
//!
//! Implements the `RpcClient` port over reqwest. One pooled client serves
//! every chain; the descriptor picks the endpoint and wire dialect per
//! call. No internal retry: the monitor loops already poll on a cadence,
//! so a failed call simply surfaces as a typed error for the next tick.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::trace;

use crate::domain::chain::{ChainDescriptor, ChainFamily};
use crate::domain::error::RpcError;
use crate::domain::transaction::TxReceipt;
use crate::ports::rpc_client::RpcClient;

use super::types::{
  EvmReceipt, JsonRpcRequest, JsonRpcResponse, SignatureStatusesResult, parse_hex_u64,
};

/// Configuration for the HTTP RPC client.
#[derive(Debug, Clone)]
pub struct HttpRpcConfig {
  /// Per-request timeout.
  pub timeout: Duration,
  /// Idle connections kept per endpoint.
  pub pool_max_idle: usize,
}

impl Default for HttpRpcConfig {
  fn default() -> Self {
    Self {
      timeout: Duration::from_secs(10),
      pool_max_idle: 5,
    }
  }
}

/// Pooled JSON-RPC client speaking both wire dialects.
pub struct HttpRpcClient {
  /// Underlying HTTP client.
  http: Client,
  /// Request timeout, echoed into timeout errors.
  timeout: Duration,
}

impl HttpRpcClient {
  /// Create a client with the given configuration.
  pub fn new(config: HttpRpcConfig) -> Result<Self> {
    let http = Client::builder()
      .timeout(config.timeout)
      .pool_max_idle_per_host(config.pool_max_idle)
      .build()
      .context("Failed to build HTTP client")?;

    Ok(Self { http, timeout: config.timeout })
  }

  /// Issue one call whose result must be present (non-null).
  async fn call<T: DeserializeOwned>(
    &self,
    url: &str,
    method: &'static str,
    params: serde_json::Value,
  ) -> Result<T, RpcError> {
    self
      .call_optional(url, method, params)
      .await?
      .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: missing result")))
  }

  /// Issue one call whose result may legitimately be null.
  async fn call_optional<T: DeserializeOwned>(
    &self,
    url: &str,
    method: &'static str,
    params: serde_json::Value,
  ) -> Result<Option<T>, RpcError> {
    trace!(url, method, "RPC call");
    let request = JsonRpcRequest::new(method, params);

    let response = self
      .http
      .post(url)
      .json(&request)
      .send()
      .await
      .map_err(|e| self.classify(&e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(RpcError::Transport(format!("http status {status}")));
    }

    let envelope: JsonRpcResponse<T> = response
      .json()
      .await
      .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

    if let Some(err) = envelope.error {
      return Err(RpcError::Node { code: err.code, message: err.message });
    }
    Ok(envelope.result)
  }

  fn classify(&self, err: &reqwest::Error) -> RpcError {
    if err.is_timeout() {
      RpcError::Timeout(self.timeout.as_millis() as u64)
    } else {
      RpcError::Transport(err.to_string())
    }
  }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
  async fn block_height(&self, chain: &ChainDescriptor) -> Result<u64, RpcError> {
    match chain.family {
      ChainFamily::Evm => {
        let hex: String = self.call(&chain.rpc_url, "eth_blockNumber", json!([])).await?;
        parse_hex_u64(&hex)
      }
      ChainFamily::Solana => self.call(&chain.rpc_url, "getSlot", json!([])).await,
    }
  }

  async fn transaction_receipt(
    &self,
    chain: &ChainDescriptor,
    hash: &str,
  ) -> Result<Option<TxReceipt>, RpcError> {
    match chain.family {
      ChainFamily::Evm => {
        let receipt: Option<EvmReceipt> = self
          .call_optional(&chain.rpc_url, "eth_getTransactionReceipt", json!([hash]))
          .await?;
        receipt.map(|r| r.to_receipt()).transpose()
      }
      ChainFamily::Solana => {
        let statuses: SignatureStatusesResult = self
          .call(
            &chain.rpc_url,
            "getSignatureStatuses",
            json!([[hash], { "searchTransactionHistory": true }]),
          )
          .await?;
        Ok(
          statuses
            .value
            .into_iter()
            .next()
            .flatten()
            .map(|s| s.to_receipt()),
        )
      }
    }
  }
}
