//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP JSON-RPC, wallet bridges, file I/O).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `metrics`: Prometheus metrics export and health checks
//! - `persistence`: session store backends (file, in-memory)
//! - `providers`: wallet provider implementations
//! - `rpc`: JSON-RPC endpoint client for EVM and Solana chains

pub mod metrics;
pub mod persistence;
pub mod providers;
pub mod rpc;
