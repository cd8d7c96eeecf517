//! Wallet Provider Port - Injected Wallet Capability Interface
//!
//! Defines the trait for the host-injected wallet software (MetaMask-style
//! extension, Phantom, an operator-configured headless signer). Providers
//! own all prompting and key handling; this side only issues requests and
//! maps their native rejection codes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::chain::{Address, ChainDescriptor, ProviderKind};
use crate::domain::error::ProviderError;

/// Trait for one wallet provider capability.
///
/// Calls may suspend indefinitely on a wallet-native prompt; cancellation
/// is the provider's concern. Implementations map their native error codes
/// onto `ProviderError` (4001 = `UserRejected`, 4902 = `UnknownChain`).
#[async_trait]
pub trait WalletProvider: Send + Sync + 'static {
  /// Whether the capability is currently injected and reachable.
  async fn is_available(&self) -> bool;

  /// Request the account list, prompting the user when required.
  ///
  /// An approved request returns at least one address; an empty list means
  /// the wallet is locked or has no accounts exposed.
  async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

  /// Ask the wallet to switch its active network to `chain`.
  ///
  /// Fails with `UnknownChain` when the wallet has no entry for it.
  async fn request_chain_switch(&self, chain: &ChainDescriptor) -> Result<(), ProviderError>;

  /// Ask the wallet to add `chain` (RPC, explorer, currency) to its list.
  async fn request_chain_add(&self, chain: &ChainDescriptor) -> Result<(), ProviderError>;
}

/// Registry of injected providers, keyed by kind.
///
/// Built once at wiring time, then shared read-only. An unregistered kind
/// surfaces as `ProviderUnavailable` at the registry layer.
#[derive(Default, Clone)]
pub struct ProviderDirectory {
  providers: HashMap<ProviderKind, Arc<dyn WalletProvider>>,
}

impl ProviderDirectory {
  /// Empty directory.
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers (or replaces) the provider for a kind.
  pub fn register(&mut self, kind: ProviderKind, provider: Arc<dyn WalletProvider>) {
    self.providers.insert(kind, provider);
  }

  /// Provider for a kind, if registered.
  pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn WalletProvider>> {
    self.providers.get(&kind).map(Arc::clone)
  }

  /// Kinds currently registered.
  pub fn kinds(&self) -> Vec<ProviderKind> {
    self.providers.keys().copied().collect()
  }
}

impl std::fmt::Debug for ProviderDirectory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ProviderDirectory")
      .field("kinds", &self.kinds())
      .finish()
  }
}
