//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `WalletProvider`: Injected wallet capability (accounts, chain switch)
//! - `RpcClient`: Chain head and transaction receipt queries
//! - `KeyValueStore`: Session snapshot persistence

pub mod rpc_client;
pub mod store;
pub mod wallet_provider;
