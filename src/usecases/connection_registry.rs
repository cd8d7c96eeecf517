//! Connection Registry Use Case - Wallet Session Lifecycle
//!
//! Owns the one-connection-per-chain set and the single active pairing.
//! Delegates handshakes to the family connector, starts and stops network
//! monitoring as chains connect and disconnect, persists the session set
//! after every mutation, and restores it optimistically at startup
//! (restored sessions re-validate lazily on first provider-facing use).

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, instrument, warn};

use crate::domain::chain::{ChainId, ChainRegistry, ProviderKind};
use crate::domain::connection::{ConnectionSet, PersistedSessions, WalletConnection};
use crate::domain::error::WalletError;
use crate::ports::rpc_client::RpcClient;
use crate::ports::store::KeyValueStore;
use crate::ports::wallet_provider::{ProviderDirectory, WalletProvider};
use crate::usecases::network_monitor::NetworkMonitor;
use crate::usecases::wallet_connector::connector_for;

/// Store key holding the serialized session set.
pub const SESSIONS_KEY: &str = "wallet.sessions";

/// Capacity of the connection event channel.
const EVENT_CAPACITY: usize = 64;

/// Connection lifecycle notifications.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
  /// A connect handshake completed.
  Connected(WalletConnection),
  /// A connection was removed.
  Disconnected { chain_id: ChainId },
  /// The active pairing moved (or cleared).
  ActiveChanged { chain_id: Option<ChainId> },
  /// Persisted sessions were rebuilt at startup.
  Restored { connections: usize, active_chain: Option<ChainId> },
}

/// Registry of wallet sessions across chains.
pub struct ConnectionRegistry<S: KeyValueStore, R: RpcClient> {
  /// Chain catalog.
  chains: Arc<ChainRegistry>,
  /// Injected wallet providers by kind.
  providers: ProviderDirectory,
  /// Session snapshot persistence.
  store: Arc<S>,
  /// Per-chain liveness monitoring, driven by connect/disconnect.
  network: Arc<NetworkMonitor<R>>,
  /// The session set and active pairing.
  connections: RwLock<ConnectionSet>,
  /// Chains with a connect handshake in flight.
  connecting: Mutex<HashSet<ChainId>>,
  /// Lifecycle event fan-out.
  events: broadcast::Sender<ConnectionEvent>,
}

impl<S: KeyValueStore, R: RpcClient> ConnectionRegistry<S, R> {
  /// Create a registry over the given catalog, providers, store, and
  /// network monitor.
  pub fn new(
    chains: Arc<ChainRegistry>,
    providers: ProviderDirectory,
    store: Arc<S>,
    network: Arc<NetworkMonitor<R>>,
  ) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      chains,
      providers,
      store,
      network,
      connections: RwLock::new(ConnectionSet::new()),
      connecting: Mutex::new(HashSet::new()),
      events,
    }
  }

  /// Connect a wallet to a chain.
  ///
  /// Fails fast on catalog misses, incompatible or unavailable providers,
  /// and same-chain handshakes already in flight. A failed handshake
  /// leaves the registry exactly as it was.
  #[instrument(skip(self), fields(chain = %chain_id, provider = %kind))]
  pub async fn connect(
    &self,
    chain_id: &str,
    kind: ProviderKind,
  ) -> Result<WalletConnection, WalletError> {
    let chain = self
      .chains
      .lookup(chain_id)
      .cloned()
      .ok_or_else(|| WalletError::UnsupportedChain { chain_id: chain_id.to_string() })?;
    if !chain.supports(kind) {
      return Err(WalletError::IncompatibleProvider { chain_id: chain.id.clone(), kind });
    }
    let provider = self
      .providers
      .get(kind)
      .ok_or(WalletError::ProviderUnavailable { kind })?;
    if !provider.is_available().await {
      return Err(WalletError::ProviderUnavailable { kind });
    }

    // Same-chain handshakes must not overlap: the wallet prompt is modal.
    {
      let mut connecting = self.connecting.lock().await;
      if !connecting.insert(chain.id.clone()) {
        return Err(WalletError::AlreadyConnecting { chain_id: chain.id.clone() });
      }
    }

    let handshake = connector_for(chain.family, provider).connect(&chain).await;

    {
      let mut connecting = self.connecting.lock().await;
      connecting.remove(&chain.id);
    }

    let address = match handshake {
      Ok(address) => address,
      Err(e) => {
        warn!(chain = %chain.id, error = %e, "Connect handshake failed");
        return Err(e);
      }
    };

    let conn = WalletConnection::established(address, chain.id.clone(), kind);
    let (activated, snapshot) = {
      let mut set = self.connections.write().await;
      let active_before = set.active_chain().map(String::from);
      set.insert(conn.clone());
      let activated = active_before.as_deref() != set.active_chain();
      (activated, set.to_persisted())
    };

    self.network.start(chain).await;
    self.persist(&snapshot).await;

    let _ = self.events.send(ConnectionEvent::Connected(conn.clone()));
    if activated {
      let _ = self
        .events
        .send(ConnectionEvent::ActiveChanged { chain_id: Some(conn.chain_id.clone()) });
    }

    info!(chain = %conn.chain_id, address = %conn.address, "Wallet connected");
    Ok(conn)
  }

  /// Disconnect a chain's session. Idempotent; returns whether a session
  /// existed.
  ///
  /// When the active pairing goes, the earliest-connected survivor takes
  /// over (chain-id tie-break).
  #[instrument(skip(self))]
  pub async fn disconnect(&self, chain_id: &str) -> bool {
    let outcome = {
      let mut set = self.connections.write().await;
      let active_before = set.active_chain().map(String::from);
      let removed = set.remove(chain_id);
      let active_after = set.active_chain().map(String::from);
      removed.map(|_| (active_before != active_after, active_after, set.to_persisted()))
    };
    let Some((active_changed, active_after, snapshot)) = outcome else {
      debug!(chain = %chain_id, "No session to disconnect");
      return false;
    };

    self.network.stop(chain_id).await;
    self.persist(&snapshot).await;

    let _ = self
      .events
      .send(ConnectionEvent::Disconnected { chain_id: chain_id.to_string() });
    if active_changed {
      let _ = self
        .events
        .send(ConnectionEvent::ActiveChanged { chain_id: active_after });
    }

    info!(chain = %chain_id, "Wallet disconnected");
    true
  }

  /// Disconnect every session and persist the empty set.
  #[instrument(skip(self))]
  pub async fn disconnect_all(&self) {
    let (chain_ids, snapshot) = {
      let mut set = self.connections.write().await;
      let ids: Vec<ChainId> = set
        .iter_ordered()
        .iter()
        .map(|c| c.chain_id.clone())
        .collect();
      set.clear();
      (ids, set.to_persisted())
    };
    if chain_ids.is_empty() {
      return;
    }

    for chain_id in &chain_ids {
      self.network.stop(chain_id).await;
      let _ = self
        .events
        .send(ConnectionEvent::Disconnected { chain_id: chain_id.clone() });
    }
    self.persist(&snapshot).await;
    let _ = self.events.send(ConnectionEvent::ActiveChanged { chain_id: None });

    info!(count = chain_ids.len(), "All wallets disconnected");
  }

  /// Make an existing connection the active pairing.
  ///
  /// A restored session is re-validated against its provider first; when
  /// validation fails the stale session is disconnected and the error
  /// surfaces. The wallet is asked to switch networks before the pairing
  /// moves, so a rejected switch leaves the previous pairing active.
  #[instrument(skip(self))]
  pub async fn switch_active(&self, chain_id: &str) -> Result<WalletConnection, WalletError> {
    let conn = {
      let set = self.connections.read().await;
      set.get(chain_id).cloned()
    }
    .ok_or_else(|| WalletError::NotConnected { chain_id: chain_id.to_string() })?;

    let chain = self
      .chains
      .lookup(chain_id)
      .cloned()
      .ok_or_else(|| WalletError::UnsupportedChain { chain_id: chain_id.to_string() })?;
    let provider = self
      .providers
      .get(conn.provider)
      .ok_or(WalletError::ProviderUnavailable { kind: conn.provider })?;

    if conn.restored {
      self.revalidate(&conn, Arc::clone(&provider)).await?;
    }

    connector_for(chain.family, provider).switch_chain(&chain).await?;

    let (updated, snapshot) = {
      let mut set = self.connections.write().await;
      if !set.set_active(chain_id) {
        // disconnected while the wallet prompt was open
        return Err(WalletError::NotConnected { chain_id: chain_id.to_string() });
      }
      let updated = set
        .get(chain_id)
        .cloned()
        .ok_or_else(|| WalletError::NotConnected { chain_id: chain_id.to_string() })?;
      (updated, set.to_persisted())
    };

    self.persist(&snapshot).await;
    let _ = self
      .events
      .send(ConnectionEvent::ActiveChanged { chain_id: Some(chain_id.to_string()) });

    info!(chain = %chain_id, "Active chain switched");
    Ok(updated)
  }

  /// Rebuild sessions from the store, optimistically.
  ///
  /// No provider round-trips happen here; every session comes back with
  /// `restored = true` and is validated on its first provider-facing use.
  /// Returns the number of sessions restored.
  #[instrument(skip(self))]
  pub async fn restore(&self) -> anyhow::Result<usize> {
    let raw = self
      .store
      .get(SESSIONS_KEY)
      .await
      .context("Failed to read persisted sessions")?;
    let Some(raw) = raw else {
      debug!("No persisted sessions found");
      return Ok(0);
    };
    let snapshot: PersistedSessions = match serde_json::from_str(&raw) {
      Ok(snapshot) => snapshot,
      Err(e) => {
        warn!(error = %e, "Persisted sessions unreadable, starting clean");
        return Ok(0);
      }
    };

    // Sessions whose chain left the catalog cannot be monitored; drop them.
    let mut known = Vec::new();
    for conn in snapshot.connections {
      if self.chains.lookup(&conn.chain_id).is_some() {
        known.push(conn);
      } else {
        warn!(chain = %conn.chain_id, "Dropping persisted session for unknown chain");
      }
    }
    let set = ConnectionSet::from_persisted(PersistedSessions {
      connections: known,
      active_chain: snapshot.active_chain,
    });
    let restored: Vec<WalletConnection> = set.iter_ordered().into_iter().cloned().collect();
    let active = set.active_chain().map(String::from);

    {
      let mut connections = self.connections.write().await;
      *connections = set;
    }

    for conn in &restored {
      if let Some(chain) = self.chains.lookup(&conn.chain_id).cloned() {
        self.network.start(chain).await;
      }
    }

    let count = restored.len();
    if count > 0 {
      let _ = self.events.send(ConnectionEvent::Restored {
        connections: count,
        active_chain: active.clone(),
      });
      let _ = self.events.send(ConnectionEvent::ActiveChanged { chain_id: active.clone() });
      info!(count, active = ?active, "Wallet sessions restored");
    }
    Ok(count)
  }

  /// Current connections, earliest first.
  pub async fn connections(&self) -> Vec<WalletConnection> {
    let set = self.connections.read().await;
    set.iter_ordered().into_iter().cloned().collect()
  }

  /// The active pairing, if any.
  pub async fn active(&self) -> Option<WalletConnection> {
    let set = self.connections.read().await;
    set.active_connection().cloned()
  }

  /// Whether a chain currently has a session.
  pub async fn is_connected(&self, chain_id: &str) -> bool {
    let set = self.connections.read().await;
    set.contains(chain_id)
  }

  /// Subscribe to connection lifecycle events.
  pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
    self.events.subscribe()
  }

  /// Prompt-free re-validation of a restored session.
  async fn revalidate(
    &self,
    conn: &WalletConnection,
    provider: Arc<dyn WalletProvider>,
  ) -> Result<(), WalletError> {
    debug!(chain = %conn.chain_id, "Re-validating restored session");
    let accounts = match provider.request_accounts().await {
      Ok(accounts) if !accounts.is_empty() => accounts,
      Ok(_) => {
        warn!(chain = %conn.chain_id, "Restored session has no accounts, disconnecting");
        self.disconnect(&conn.chain_id).await;
        return Err(WalletError::NoAccounts);
      }
      Err(e) => {
        warn!(chain = %conn.chain_id, error = %e, "Restored session failed validation, disconnecting");
        self.disconnect(&conn.chain_id).await;
        return Err(e.into());
      }
    };

    let snapshot = {
      let mut set = self.connections.write().await;
      if let Some(entry) = set.get_mut(&conn.chain_id) {
        entry.restored = false;
        if !accounts.contains(&entry.address) {
          // wallet switched accounts since the session was saved
          if let Some(first) = accounts.first() {
            info!(chain = %conn.chain_id, address = %first, "Adopting current wallet account");
            entry.address = first.clone();
          }
        }
      }
      set.to_persisted()
    };
    self.persist(&snapshot).await;
    Ok(())
  }

  /// Write the session snapshot, warn-and-continue on failure.
  ///
  /// Live state wins over snapshot durability; the next successful
  /// mutation rewrites the whole document.
  async fn persist(&self, snapshot: &PersistedSessions) {
    let payload = match serde_json::to_string(snapshot) {
      Ok(payload) => payload,
      Err(e) => {
        warn!(error = %e, "Failed to serialize sessions");
        return;
      }
    };
    if let Err(e) = self.store.put(SESSIONS_KEY, &payload).await {
      warn!(error = %e, "Failed to persist wallet sessions");
    }
  }
}
