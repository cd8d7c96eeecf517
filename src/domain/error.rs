//! Error taxonomies for wallet, provider, and RPC operations.
//!
//! Three layers: `ProviderError` carries wallet-native rejection codes,
//! `WalletError` is what connection-level operations surface to callers,
//! `RpcError` covers the chain RPC capability. RPC errors are transient
//! inside monitor loops (retried next tick); wallet errors are synchronous
//! and never leave registry state half-mutated.

use thiserror::Error;

use super::chain::{ChainId, ProviderKind};

/// Wallet-provider native failure, mapped from the provider's error codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider capability is not injected / reachable
    #[error("wallet provider is unavailable")]
    Unavailable,

    /// User dismissed the wallet prompt (EIP-1193 code 4001)
    #[error("user rejected the wallet request")]
    UserRejected,

    /// Wallet does not know the requested network (EIP-1193 code 4902)
    #[error("wallet does not recognize chain {chain_id}")]
    UnknownChain { chain_id: ChainId },

    /// Provider cannot perform the requested operation at all
    #[error("provider does not support {0}")]
    Unsupported(&'static str),

    /// Any other provider-reported failure
    #[error("provider request failed: {0}")]
    Request(String),
}

/// Connection-level failure surfaced by the registry and connectors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// Chain id is absent from the catalog
    #[error("unsupported chain: {chain_id}")]
    UnsupportedChain { chain_id: ChainId },

    /// Catalog excludes this wallet kind for the chain
    #[error("provider {kind} is not compatible with chain {chain_id}")]
    IncompatibleProvider { chain_id: ChainId, kind: ProviderKind },

    /// No provider of the kind is registered or it reports unavailable
    #[error("no available provider of kind {kind}")]
    ProviderUnavailable { kind: ProviderKind },

    /// User dismissed the wallet prompt
    #[error("user rejected the connection request")]
    UserRejected,

    /// Provider returned an empty account list
    #[error("wallet returned no accounts")]
    NoAccounts,

    /// A connect for the same chain is already in flight
    #[error("connection to chain {chain_id} already in progress")]
    AlreadyConnecting { chain_id: ChainId },

    /// Operation requires an existing connection for the chain
    #[error("no connection for chain {chain_id}")]
    NotConnected { chain_id: ChainId },

    /// Underlying provider failure not covered by a taxon above
    #[error("provider error: {0}")]
    Provider(ProviderError),
}

impl From<ProviderError> for WalletError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => Self::UserRejected,
            other => Self::Provider(other),
        }
    }
}

/// Chain RPC failure.
///
/// Monitor loops treat every variant as transient: the status flips to
/// error and the next tick retries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// Connection / transport-level failure
    #[error("rpc transport error: {0}")]
    Transport(String),

    /// Request exceeded the configured deadline
    #[error("rpc request timed out after {0} ms")]
    Timeout(u64),

    /// Node returned a JSON-RPC error object
    #[error("rpc node error {code}: {message}")]
    Node { code: i64, message: String },

    /// Response did not match the expected wire shape
    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_collapses() {
        let err: WalletError = ProviderError::UserRejected.into();
        assert_eq!(err, WalletError::UserRejected);
    }

    #[test]
    fn test_other_provider_errors_wrap() {
        let err: WalletError = ProviderError::Unavailable.into();
        assert_eq!(err, WalletError::Provider(ProviderError::Unavailable));
    }

    #[test]
    fn test_display_messages() {
        let err = WalletError::UnsupportedChain { chain_id: "dogecoin".to_string() };
        assert_eq!(err.to_string(), "unsupported chain: dogecoin");

        let err = RpcError::Node { code: -32000, message: "header not found".to_string() };
        assert_eq!(err.to_string(), "rpc node error -32000: header not found");

        let err = RpcError::Timeout(5000);
        assert_eq!(err.to_string(), "rpc request timed out after 5000 ms");
    }
}
