//! Domain layer - Core business logic and models.
//!
//! This module contains the pure state machines for chains, connections,
//! network health, and transaction confirmation. No I/O allowed here
//! (hexagonal architecture inner ring). All types are serializable and
//! testable in isolation.

pub mod chain;
pub mod connection;
pub mod error;
pub mod network;
pub mod transaction;

// Re-export core types for convenience
pub use chain::{
    Address, ChainDescriptor, ChainFamily, ChainFilter, ChainId, ChainRegistry,
    NativeCurrency, ProviderKind, TxHash,
};
pub use connection::{ConnectionSet, PersistedSessions, WalletConnection};
pub use error::{ProviderError, RpcError, WalletError};
pub use network::{NetworkHealth, NetworkStatus, StatusReport, TxCounts};
pub use transaction::{MonitorOptions, MonitoredTransaction, TxReceipt, TxStatus};
