//! Unattended Provider - Prompt-Free Wallet Capability
//!
//! Implements the `WalletProvider` port for headless deployments: a fixed
//! account list and a seed set of known chains, configured rather than
//! prompted. Chain-add requests grow the known set, so the add-then-retry
//! switch path behaves exactly as it does against a browser wallet.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::chain::{Address, ChainDescriptor, ChainId};
use crate::domain::error::ProviderError;
use crate::ports::wallet_provider::WalletProvider;

/// Configuration-driven provider that never prompts.
pub struct UnattendedProvider {
    /// Accounts exposed to every request.
    accounts: Vec<Address>,
    /// Chains the wallet-side already "knows"; switch targets outside
    /// this set report `UnknownChain` until added.
    known_chains: RwLock<HashSet<ChainId>>,
    /// Reported availability.
    online: bool,
}

impl UnattendedProvider {
    /// Provider with the given accounts and pre-known chains.
    pub fn new(
        accounts: Vec<Address>,
        known_chains: impl IntoIterator<Item = ChainId>,
    ) -> Self {
        Self {
            accounts,
            known_chains: RwLock::new(known_chains.into_iter().collect()),
            online: true,
        }
    }

    /// Provider that reports itself unavailable.
    pub fn offline() -> Self {
        Self {
            accounts: Vec::new(),
            known_chains: RwLock::new(HashSet::new()),
            online: false,
        }
    }
}

#[async_trait]
impl WalletProvider for UnattendedProvider {
    async fn is_available(&self) -> bool {
        self.online
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if !self.online {
            return Err(ProviderError::Unavailable);
        }
        Ok(self.accounts.clone())
    }

    async fn request_chain_switch(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
        if !self.online {
            return Err(ProviderError::Unavailable);
        }
        let known = self.known_chains.read().await;
        if known.contains(&chain.id) {
            debug!(chain = %chain.id, "Switched to known chain");
            Ok(())
        } else {
            Err(ProviderError::UnknownChain { chain_id: chain.id.clone() })
        }
    }

    async fn request_chain_add(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
        if !self.online {
            return Err(ProviderError::Unavailable);
        }
        let mut known = self.known_chains.write().await;
        known.insert(chain.id.clone());
        debug!(chain = %chain.id, "Chain added to known set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::ChainRegistry;

    fn chain(id: &str) -> ChainDescriptor {
        ChainRegistry::builtin().lookup(id).unwrap().clone()
    }

    #[tokio::test]
    async fn test_accounts_and_availability() {
        let provider =
            UnattendedProvider::new(vec!["0xoperator".to_string()], vec!["ethereum".to_string()]);
        assert!(provider.is_available().await);
        assert_eq!(provider.request_accounts().await.unwrap(), vec!["0xoperator"]);
    }

    #[tokio::test]
    async fn test_switch_unknown_then_add() {
        let provider =
            UnattendedProvider::new(vec!["0xoperator".to_string()], vec!["ethereum".to_string()]);

        let err = provider.request_chain_switch(&chain("polygon")).await.unwrap_err();
        assert_eq!(err, ProviderError::UnknownChain { chain_id: "polygon".to_string() });

        provider.request_chain_add(&chain("polygon")).await.unwrap();
        provider.request_chain_switch(&chain("polygon")).await.unwrap();
    }

    #[tokio::test]
    async fn test_offline_rejects_everything() {
        let provider = UnattendedProvider::offline();
        assert!(!provider.is_available().await);
        assert_eq!(
            provider.request_accounts().await.unwrap_err(),
            ProviderError::Unavailable
        );
        assert_eq!(
            provider.request_chain_switch(&chain("ethereum")).await.unwrap_err(),
            ProviderError::Unavailable
        );
    }
}
