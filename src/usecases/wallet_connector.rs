//! Wallet Connector Use Case - Connect and Chain-Switch Handshakes
//!
//! One connector per chain family, each driving a `WalletProvider` port:
//! - Account-based (EVM): request accounts, then point the wallet at the
//!   target network, adding it first when the wallet reports it unknown.
//! - Solana-style: request accounts only; the wallet manages its own
//!   cluster, so switching is a local no-op.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::chain::{Address, ChainDescriptor, ChainFamily};
use crate::domain::error::{ProviderError, WalletError};
use crate::ports::wallet_provider::WalletProvider;

/// Trait for the family-specific connect handshake.
#[async_trait]
pub trait WalletConnector: Send + Sync {
  /// Run the connect handshake, returning the primary account address.
  async fn connect(&self, chain: &ChainDescriptor) -> Result<Address, WalletError>;

  /// Point the wallet at `chain`, adding it first when unknown.
  async fn switch_chain(&self, chain: &ChainDescriptor) -> Result<(), WalletError>;
}

/// Selects the connector implementation for a chain family.
pub fn connector_for(
  family: ChainFamily,
  provider: Arc<dyn WalletProvider>,
) -> Box<dyn WalletConnector> {
  match family {
    ChainFamily::Evm => Box::new(AccountConnector::new(provider)),
    ChainFamily::Solana => Box::new(SolanaConnector::new(provider)),
  }
}

/// Connector for account-based EVM wallets.
pub struct AccountConnector {
  provider: Arc<dyn WalletProvider>,
}

impl AccountConnector {
  /// Create a connector over an EVM-capable provider.
  pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
    Self { provider }
  }
}

#[async_trait]
impl WalletConnector for AccountConnector {
  async fn connect(&self, chain: &ChainDescriptor) -> Result<Address, WalletError> {
    let accounts = self.provider.request_accounts().await?;
    let address = accounts.first().cloned().ok_or(WalletError::NoAccounts)?;

    // The wallet may be parked on a different network; align it before
    // reporting the connection established.
    self.switch_chain(chain).await?;

    debug!(chain = %chain.id, address = %address, "Account handshake complete");
    Ok(address)
  }

  async fn switch_chain(&self, chain: &ChainDescriptor) -> Result<(), WalletError> {
    match self.provider.request_chain_switch(chain).await {
      Ok(()) => Ok(()),
      Err(ProviderError::UnknownChain { .. }) => {
        // EIP-4902 path: register the network from catalog metadata,
        // then retry the switch exactly once.
        info!(chain = %chain.id, "Wallet missing network, requesting add");
        self.provider.request_chain_add(chain).await?;
        self
          .provider
          .request_chain_switch(chain)
          .await
          .map_err(WalletError::from)
      }
      Err(e) => Err(e.into()),
    }
  }
}

/// Connector for Solana-style wallets.
pub struct SolanaConnector {
  provider: Arc<dyn WalletProvider>,
}

impl SolanaConnector {
  /// Create a connector over a Solana-capable provider.
  pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
    Self { provider }
  }
}

#[async_trait]
impl WalletConnector for SolanaConnector {
  async fn connect(&self, chain: &ChainDescriptor) -> Result<Address, WalletError> {
    let accounts = self.provider.request_accounts().await?;
    let address = accounts.first().cloned().ok_or(WalletError::NoAccounts)?;
    debug!(chain = %chain.id, address = %address, "Solana handshake complete");
    Ok(address)
  }

  async fn switch_chain(&self, _chain: &ChainDescriptor) -> Result<(), WalletError> {
    // The wallet pins its own cluster; there is no switch request to send.
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::chain::ChainRegistry;
  use std::sync::Mutex;

  /// Scriptable provider stub recording the calls it receives.
  struct ScriptedProvider {
    accounts: Vec<Address>,
    /// Chains the wallet already knows; switch outside this set is 4902.
    known_chains: Mutex<Vec<String>>,
    reject_accounts: bool,
    calls: Mutex<Vec<&'static str>>,
  }

  impl ScriptedProvider {
    fn new(accounts: Vec<&str>, known_chains: Vec<&str>) -> Self {
      Self {
        accounts: accounts.into_iter().map(String::from).collect(),
        known_chains: Mutex::new(known_chains.into_iter().map(String::from).collect()),
        reject_accounts: false,
        calls: Mutex::new(Vec::new()),
      }
    }

    fn calls(&self) -> Vec<&'static str> {
      self.calls.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl WalletProvider for ScriptedProvider {
    async fn is_available(&self) -> bool {
      true
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
      self.calls.lock().unwrap().push("accounts");
      if self.reject_accounts {
        return Err(ProviderError::UserRejected);
      }
      Ok(self.accounts.clone())
    }

    async fn request_chain_switch(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
      self.calls.lock().unwrap().push("switch");
      if self.known_chains.lock().unwrap().contains(&chain.id) {
        Ok(())
      } else {
        Err(ProviderError::UnknownChain { chain_id: chain.id.clone() })
      }
    }

    async fn request_chain_add(&self, chain: &ChainDescriptor) -> Result<(), ProviderError> {
      self.calls.lock().unwrap().push("add");
      self.known_chains.lock().unwrap().push(chain.id.clone());
      Ok(())
    }
  }

  fn chain(id: &str) -> ChainDescriptor {
    ChainRegistry::builtin().lookup(id).unwrap().clone()
  }

  #[tokio::test]
  async fn test_evm_connect_returns_first_account() {
    let provider = Arc::new(ScriptedProvider::new(vec!["0xaaa", "0xbbb"], vec!["ethereum"]));
    let connector = AccountConnector::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);

    let address = connector.connect(&chain("ethereum")).await.unwrap();
    assert_eq!(address, "0xaaa");
    assert_eq!(provider.calls(), vec!["accounts", "switch"]);
  }

  #[tokio::test]
  async fn test_evm_connect_no_accounts() {
    let provider = Arc::new(ScriptedProvider::new(vec![], vec!["ethereum"]));
    let connector = AccountConnector::new(provider as Arc<dyn WalletProvider>);

    let err = connector.connect(&chain("ethereum")).await.unwrap_err();
    assert_eq!(err, WalletError::NoAccounts);
  }

  #[tokio::test]
  async fn test_unknown_chain_triggers_add_then_retry() {
    let provider = Arc::new(ScriptedProvider::new(vec!["0xaaa"], vec![]));
    let connector = AccountConnector::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);

    connector.switch_chain(&chain("polygon")).await.unwrap();
    assert_eq!(provider.calls(), vec!["switch", "add", "switch"]);
  }

  #[tokio::test]
  async fn test_user_rejection_maps_to_wallet_error() {
    let mut stub = ScriptedProvider::new(vec!["0xaaa"], vec!["ethereum"]);
    stub.reject_accounts = true;
    let connector = AccountConnector::new(Arc::new(stub) as Arc<dyn WalletProvider>);

    let err = connector.connect(&chain("ethereum")).await.unwrap_err();
    assert_eq!(err, WalletError::UserRejected);
  }

  #[tokio::test]
  async fn test_solana_switch_is_local_noop() {
    let provider = Arc::new(ScriptedProvider::new(vec!["So1addr"], vec![]));
    let connector = SolanaConnector::new(Arc::clone(&provider) as Arc<dyn WalletProvider>);

    connector.switch_chain(&chain("solana")).await.unwrap();
    assert!(provider.calls().is_empty());

    let address = connector.connect(&chain("solana")).await.unwrap();
    assert_eq!(address, "So1addr");
    assert_eq!(provider.calls(), vec!["accounts"]);
  }
}
