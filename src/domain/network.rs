//! Network health domain types.
//!
//! Status snapshots published by the network monitor, one per chain per
//! poll tick, plus the aggregate report the daemon exposes on /status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::chain::ChainId;

/// Health classification of one chain's RPC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkHealth {
    /// Last probe succeeded
    Connected,
    /// Monitoring started, first probe not yet answered
    Connecting,
    /// Monitoring stopped for this chain
    Disconnected,
    /// Last probe failed
    Error,
}

impl std::fmt::Display for NetworkHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected => write!(f, "connected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One chain's status as of its most recent probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStatus {
    /// Chain this snapshot describes
    pub chain_id: ChainId,
    /// Health classification
    pub health: NetworkHealth,
    /// Chain head (block number / slot) from the last successful probe
    pub block_height: Option<u64>,
    /// Round-trip latency of the last probe in milliseconds
    pub latency_ms: Option<u64>,
    /// Error message when health is `Error`
    pub error: Option<String>,
    /// When the snapshot was taken
    pub checked_at: DateTime<Utc>,
}

impl NetworkStatus {
    /// Initial snapshot emitted when monitoring starts.
    pub fn connecting(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            health: NetworkHealth::Connecting,
            block_height: None,
            latency_ms: None,
            error: None,
            checked_at: Utc::now(),
        }
    }

    /// Snapshot for a successful probe.
    pub fn connected(chain_id: ChainId, block_height: u64, latency_ms: u64) -> Self {
        Self {
            chain_id,
            health: NetworkHealth::Connected,
            block_height: Some(block_height),
            latency_ms: Some(latency_ms),
            error: None,
            checked_at: Utc::now(),
        }
    }

    /// Snapshot for a failed probe.
    pub fn errored(chain_id: ChainId, latency_ms: u64, message: String) -> Self {
        Self {
            chain_id,
            health: NetworkHealth::Error,
            block_height: None,
            latency_ms: Some(latency_ms),
            error: Some(message),
            checked_at: Utc::now(),
        }
    }

    /// Final snapshot emitted when monitoring stops.
    pub fn disconnected(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            health: NetworkHealth::Disconnected,
            block_height: None,
            latency_ms: None,
            error: None,
            checked_at: Utc::now(),
        }
    }

    /// Whether the endpoint answered its last probe.
    pub fn is_healthy(&self) -> bool {
        self.health == NetworkHealth::Connected
    }
}

/// Aggregate snapshot fed to the /status endpoint and periodic log line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusReport {
    /// Number of wallet connections currently held
    pub connections: usize,
    /// Active chain id, if any
    pub active_chain: Option<ChainId>,
    /// Latest per-chain network status, catalog order not guaranteed
    pub networks: Vec<NetworkStatus>,
    /// Tracked transactions by state
    pub transactions: TxCounts,
    /// When the report was assembled
    pub generated_at: Option<DateTime<Utc>>,
}

/// Derived transaction counts; computed on read, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCounts {
    pub pending: usize,
    pub confirmed: usize,
    pub failed: usize,
    pub dropped: usize,
}

impl TxCounts {
    /// Total tracked transactions.
    pub fn total(&self) -> usize {
        self.pending + self.confirmed + self.failed + self.dropped
    }
}
