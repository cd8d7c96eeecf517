//! JSON-RPC Wire Types
//!
//! Envelope and result types for the two RPC dialects the client speaks:
//! eth_* methods on EVM chains and getSlot / getSignatureStatuses on
//! Solana-style chains. Parsing helpers are pure so they test without a
//! transport.

use serde::{Deserialize, Serialize};

use crate::domain::error::RpcError;
use crate::domain::transaction::TxReceipt;

/// Outgoing JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
  /// Always "2.0".
  pub jsonrpc: &'static str,
  /// Request id; responses are matched per call, so a constant works.
  pub id: u32,
  /// Method name.
  pub method: &'static str,
  /// Positional parameters.
  pub params: serde_json::Value,
}

impl JsonRpcRequest {
  /// Build a request for `method` with positional `params`.
  pub fn new(method: &'static str, params: serde_json::Value) -> Self {
    Self { jsonrpc: "2.0", id: 1, method, params }
  }
}

/// Incoming JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse<T> {
  /// Result payload; null and absent both decode to `None`.
  pub result: Option<T>,
  /// Error object on failure.
  pub error: Option<JsonRpcErrorObject>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcErrorObject {
  /// Numeric error code.
  pub code: i64,
  /// Human-readable message.
  pub message: String,
}

/// EVM transaction receipt, the fields the monitor consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct EvmReceipt {
  /// Block the transaction landed in, hex-encoded.
  #[serde(rename = "blockNumber")]
  pub block_number: String,
  /// Post-Byzantium execution status: "0x1" success, "0x0" reverted.
  #[serde(default)]
  pub status: Option<String>,
  /// Gas consumed, hex-encoded.
  #[serde(rename = "gasUsed", default)]
  pub gas_used: Option<String>,
}

impl EvmReceipt {
  /// Convert to the family-agnostic receipt.
  ///
  /// Receipts without a status field (pre-Byzantium nodes) are treated as
  /// successful; only an explicit "0x0" marks a revert.
  pub fn to_receipt(&self) -> Result<TxReceipt, RpcError> {
    let block_number = parse_hex_u64(&self.block_number)?;
    let success = self.status.as_deref() != Some("0x0");
    let gas_used = self
      .gas_used
      .as_deref()
      .and_then(|hex| parse_hex_u64(hex).ok());
    Ok(TxReceipt { block_number, success, gas_used })
  }
}

/// Result of getSignatureStatuses: context is ignored, only the value
/// array matters.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureStatusesResult {
  /// One entry per requested signature; null = unknown to the node.
  pub value: Vec<Option<SignatureStatus>>,
}

/// Per-signature status from getSignatureStatuses.
#[derive(Debug, Clone, Deserialize)]
pub struct SignatureStatus {
  /// Slot the transaction was processed in.
  pub slot: u64,
  /// Transaction error, null on success.
  #[serde(default)]
  pub err: Option<serde_json::Value>,
}

impl SignatureStatus {
  /// Convert to the family-agnostic receipt. Slots play the block role;
  /// Solana reports no gas figure here.
  pub fn to_receipt(&self) -> TxReceipt {
    TxReceipt {
      block_number: self.slot,
      success: self.err.is_none(),
      gas_used: None,
    }
  }
}

/// Parse a 0x-prefixed hex quantity.
pub fn parse_hex_u64(hex: &str) -> Result<u64, RpcError> {
  let digits = hex.strip_prefix("0x").unwrap_or(hex);
  u64::from_str_radix(digits, 16)
    .map_err(|_| RpcError::InvalidResponse(format!("bad hex quantity: {hex}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_hex_u64() {
    assert_eq!(parse_hex_u64("0x0").unwrap(), 0);
    assert_eq!(parse_hex_u64("0x1234").unwrap(), 0x1234);
    assert_eq!(parse_hex_u64("0x121eac0").unwrap(), 19_000_000);
    assert!(parse_hex_u64("0xzz").is_err());
    assert!(parse_hex_u64("").is_err());
  }

  #[test]
  fn test_request_serializes_to_wire_shape() {
    let request = JsonRpcRequest::new("eth_blockNumber", serde_json::json!([]));
    let wire = serde_json::to_string(&request).unwrap();
    assert_eq!(
      wire,
      r#"{"jsonrpc":"2.0","id":1,"method":"eth_blockNumber","params":[]}"#
    );
  }

  #[test]
  fn test_response_null_result_is_none() {
    let wire = r#"{"jsonrpc":"2.0","id":1,"result":null}"#;
    let response: JsonRpcResponse<EvmReceipt> = serde_json::from_str(wire).unwrap();
    assert!(response.result.is_none());
    assert!(response.error.is_none());
  }

  #[test]
  fn test_response_absent_result_field_is_none() {
    // Error envelopes omit `result` entirely; decoding must not require a
    // Default impl on the payload type.
    let wire = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#;
    let response: JsonRpcResponse<EvmReceipt> = serde_json::from_str(wire).unwrap();
    assert!(response.result.is_none());
    assert_eq!(response.error.unwrap().code, -32601);
  }

  #[test]
  fn test_response_error_object() {
    let wire = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"header not found"}}"#;
    let response: JsonRpcResponse<String> = serde_json::from_str(wire).unwrap();
    let err = response.error.unwrap();
    assert_eq!(err.code, -32000);
    assert_eq!(err.message, "header not found");
  }

  #[test]
  fn test_evm_receipt_success() {
    let wire = r#"{"blockNumber":"0x64","status":"0x1","gasUsed":"0x5208"}"#;
    let receipt: EvmReceipt = serde_json::from_str(wire).unwrap();
    let parsed = receipt.to_receipt().unwrap();
    assert_eq!(parsed.block_number, 100);
    assert!(parsed.success);
    assert_eq!(parsed.gas_used, Some(21_000));
  }

  #[test]
  fn test_evm_receipt_revert() {
    let wire = r#"{"blockNumber":"0x64","status":"0x0"}"#;
    let receipt: EvmReceipt = serde_json::from_str(wire).unwrap();
    let parsed = receipt.to_receipt().unwrap();
    assert!(!parsed.success);
    assert!(parsed.gas_used.is_none());
  }

  #[test]
  fn test_evm_receipt_missing_status_is_success() {
    let wire = r#"{"blockNumber":"0xa"}"#;
    let receipt: EvmReceipt = serde_json::from_str(wire).unwrap();
    assert!(receipt.to_receipt().unwrap().success);
  }

  #[test]
  fn test_signature_status_mapping() {
    let wire = r#"{"value":[{"slot":250000000,"confirmations":3,"err":null,"confirmationStatus":"confirmed"}]}"#;
    let result: SignatureStatusesResult = serde_json::from_str(wire).unwrap();
    let status = result.value.into_iter().next().flatten().unwrap();
    let receipt = status.to_receipt();
    assert_eq!(receipt.block_number, 250_000_000);
    assert!(receipt.success);
    assert!(receipt.gas_used.is_none());
  }

  #[test]
  fn test_signature_status_error_is_failure() {
    let wire = r#"{"value":[{"slot":100,"err":{"InstructionError":[0,"Custom"]}}]}"#;
    let result: SignatureStatusesResult = serde_json::from_str(wire).unwrap();
    let status = result.value.into_iter().next().flatten().unwrap();
    assert!(!status.to_receipt().success);
  }

  #[test]
  fn test_unknown_signature_is_none() {
    let wire = r#"{"value":[null]}"#;
    let result: SignatureStatusesResult = serde_json::from_str(wire).unwrap();
    assert!(result.value.into_iter().next().flatten().is_none());
  }
}
