//! RPC Client Port - Chain Liveness and Receipt Interface
//!
//! Defines the two RPC primitives the monitors need: the chain head for
//! health probes and confirmation math, and the transaction receipt for
//! outcome detection. One implementation serves every chain; the
//! descriptor selects the endpoint and wire dialect per call.

use async_trait::async_trait;

use crate::domain::chain::ChainDescriptor;
use crate::domain::error::RpcError;
use crate::domain::transaction::TxReceipt;

/// Trait for chain RPC access.
///
/// Implementations speak the chain's native JSON-RPC (eth_blockNumber /
/// eth_getTransactionReceipt for EVM, getSlot / getSignatureStatuses for
/// Solana-style chains). Errors are typed so monitor loops can classify
/// and retry; no method panics on a misbehaving node.
#[async_trait]
pub trait RpcClient: Send + Sync + 'static {
  /// Current chain head: block number for EVM, slot for Solana.
  async fn block_height(&self, chain: &ChainDescriptor) -> Result<u64, RpcError>;

  /// Receipt for a transaction hash; `None` while unmined/unknown.
  async fn transaction_receipt(
    &self,
    chain: &ChainDescriptor,
    hash: &str,
  ) -> Result<Option<TxReceipt>, RpcError>;
}
