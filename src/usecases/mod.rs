//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the wallet core's workflows. Each use case is a self-contained
//! business operation.
//!
//! Use cases:
//! - `ConnectionRegistry`: Wallet session lifecycle across chains
//! - `WalletConnector`: Family-specific connect / chain-switch handshakes
//! - `NetworkMonitor`: Per-chain RPC liveness polling
//! - `TransactionMonitor`: Receipt polling to terminal state

pub mod connection_registry;
pub mod network_monitor;
pub mod transaction_monitor;
pub mod wallet_connector;
