//! Chain RPC Adapter
//!
//! reqwest-backed implementation of the `RpcClient` port plus the
//! JSON-RPC wire types for both supported dialects.

pub mod http;
pub mod types;

pub use http::{HttpRpcClient, HttpRpcConfig};
