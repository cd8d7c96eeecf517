//! Wallet connection domain types.
//!
//! `ConnectionSet` is the pure state machine behind the connection registry:
//! at most one connection per chain, plus one distinguished active pairing
//! that must always reference a chain present in the set (or be `None`).
//! All I/O, locking, and event publishing live in the usecase layer; this
//! module is plain data so the invariants are property-testable.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chain::{Address, ChainId, ProviderKind};

/// One established wallet⇄chain pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConnection {
    /// Account address in the chain's native format
    pub address: Address,
    /// Catalog id of the paired chain
    pub chain_id: ChainId,
    /// Wallet software the pairing was established through
    pub provider: ProviderKind,
    /// Live flag; false only transiently during teardown
    pub connected: bool,
    /// When the handshake completed (or the original handshake, if restored)
    pub connected_at: DateTime<Utc>,
    /// True when rebuilt from persisted state and not yet re-validated
    /// against the provider
    pub restored: bool,
}

impl WalletConnection {
    /// Creates a freshly handshaken connection.
    pub fn established(address: Address, chain_id: ChainId, provider: ProviderKind) -> Self {
        Self {
            address,
            chain_id,
            provider,
            connected: true,
            connected_at: Utc::now(),
            restored: false,
        }
    }
}

/// Set of connections keyed by chain, plus the active pairing.
///
/// Insertion replaces any previous connection for the same chain. The first
/// insertion into an empty set becomes active automatically. Removing the
/// active chain promotes the earliest-connected survivor, ties broken by
/// chain id for determinism.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSet {
    connections: HashMap<ChainId, WalletConnection>,
    active: Option<ChainId>,
}

impl ConnectionSet {
    /// Empty set with no active pairing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) the connection for its chain.
    ///
    /// Becomes the active pairing when none exists yet.
    pub fn insert(&mut self, conn: WalletConnection) {
        let chain_id = conn.chain_id.clone();
        self.connections.insert(chain_id.clone(), conn);
        if self.active.is_none() {
            self.active = Some(chain_id);
        }
    }

    /// Removes the connection for a chain, returning it when present.
    ///
    /// When the removed chain was active, the earliest-connected remaining
    /// connection becomes active (chain-id tie-break), or none when empty.
    pub fn remove(&mut self, chain_id: &str) -> Option<WalletConnection> {
        let removed = self.connections.remove(chain_id)?;
        if self.active.as_deref() == Some(chain_id) {
            self.active = self.successor();
        }
        Some(removed)
    }

    /// Marks an existing chain as the active pairing.
    ///
    /// Returns false (set untouched) when the chain has no connection.
    pub fn set_active(&mut self, chain_id: &str) -> bool {
        if self.connections.contains_key(chain_id) {
            self.active = Some(chain_id.to_string());
            true
        } else {
            false
        }
    }

    /// Clears every connection and the active pairing.
    pub fn clear(&mut self) {
        self.connections.clear();
        self.active = None;
    }

    /// Connection for a chain, if any.
    pub fn get(&self, chain_id: &str) -> Option<&WalletConnection> {
        self.connections.get(chain_id)
    }

    /// Mutable connection access, for re-validation bookkeeping.
    pub fn get_mut(&mut self, chain_id: &str) -> Option<&mut WalletConnection> {
        self.connections.get_mut(chain_id)
    }

    /// Chain id of the active pairing.
    pub fn active_chain(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The active connection itself.
    pub fn active_connection(&self) -> Option<&WalletConnection> {
        self.active.as_ref().and_then(|id| self.connections.get(id))
    }

    /// Whether a chain currently has a connection.
    pub fn contains(&self, chain_id: &str) -> bool {
        self.connections.contains_key(chain_id)
    }

    /// Number of connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// All connections, ordered by connect time then chain id.
    pub fn iter_ordered(&self) -> Vec<&WalletConnection> {
        let mut all: Vec<&WalletConnection> = self.connections.values().collect();
        all.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.chain_id.cmp(&b.chain_id))
        });
        all
    }

    /// Snapshot for persistence.
    pub fn to_persisted(&self) -> PersistedSessions {
        PersistedSessions {
            connections: self.iter_ordered().into_iter().cloned().collect(),
            active_chain: self.active.clone(),
        }
    }

    /// Rebuilds a set from a persisted snapshot.
    ///
    /// Every connection comes back with `restored = true`. An active chain
    /// that no longer resolves to a connection is dropped rather than
    /// violating the active-pairing rule.
    pub fn from_persisted(snapshot: PersistedSessions) -> Self {
        let mut set = Self::new();
        for mut conn in snapshot.connections {
            conn.restored = true;
            conn.connected = true;
            set.insert(conn);
        }
        match snapshot.active_chain {
            Some(id) if set.contains(&id) => set.active = Some(id),
            _ if set.is_empty() => set.active = None,
            // keep the auto-selected first insertion otherwise
            _ => {}
        }
        set
    }

    fn successor(&self) -> Option<ChainId> {
        self.connections
            .values()
            .min_by(|a, b| {
                a.connected_at
                    .cmp(&b.connected_at)
                    .then_with(|| a.chain_id.cmp(&b.chain_id))
            })
            .map(|c| c.chain_id.clone())
    }
}

/// Serialized form of the connection set, written to the key-value store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedSessions {
    /// Connections in connect order
    #[serde(default)]
    pub connections: Vec<WalletConnection>,
    /// Active chain id at save time
    #[serde(default)]
    pub active_chain: Option<ChainId>,
}
