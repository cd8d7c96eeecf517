//! Chain catalog domain types.
//!
//! Defines the immutable metadata for every blockchain the system can pair
//! a wallet with, plus the registry that serves lookups over that catalog.
//! Descriptors are built once at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────
// Type aliases consumed by ports and adapters
// ────────────────────────────────────────────

/// Lightweight chain identifier used at the ports boundary (e.g. "ethereum").
pub type ChainId = String;

/// Wallet account address in the chain's native format.
pub type Address = String;

/// Transaction hash / signature in the chain's native format.
pub type TxHash = String;

// ────────────────────────────────────────────
// Enums shared across domain and ports
// ────────────────────────────────────────────

/// Address and RPC family a chain belongs to.
///
/// Determines which connect handshake and which RPC primitives apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    /// Account-based EVM chains (eth_* JSON-RPC, EIP-155 numeric ids)
    Evm,
    /// Solana-style chains (slot-based, signature statuses)
    Solana,
}

impl std::fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Evm => write!(f, "evm"),
            Self::Solana => write!(f, "solana"),
        }
    }
}

/// Wallet software a connection is established through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// MetaMask-style injected EVM extension
    #[serde(rename = "metamask")]
    MetaMask,
    /// Coinbase Wallet injected EVM extension
    CoinbaseWallet,
    /// Phantom-style Solana extension
    Phantom,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MetaMask => write!(f, "metamask"),
            Self::CoinbaseWallet => write!(f, "coinbase_wallet"),
            Self::Phantom => write!(f, "phantom"),
        }
    }
}

/// Catalog listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainFilter {
    /// Production networks only
    Mainnet,
    /// Test networks only
    Testnet,
    /// Everything in catalog order
    All,
}

// ────────────────────────────────────────────
// Descriptor
// ────────────────────────────────────────────

/// Native currency of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Ticker symbol (ETH, MATIC, SOL, ...)
    pub symbol: String,
    /// Smallest-unit decimals (18 for EVM, 9 for Solana)
    pub decimals: u8,
}

/// Immutable metadata for one supported chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// Catalog identifier, unique across the registry
    pub id: ChainId,
    /// Human-readable display name
    pub name: String,
    /// Address/RPC family
    pub family: ChainFamily,
    /// EIP-155 numeric chain id for wallet switch/add requests (EVM only)
    pub evm_chain_id: Option<u64>,
    /// Native currency metadata
    pub currency: NativeCurrency,
    /// JSON-RPC endpoint
    pub rpc_url: String,
    /// Block explorer base URL (no trailing slash)
    pub explorer_url: String,
    /// Wallet kinds this chain accepts connections from
    pub wallets: Vec<ProviderKind>,
    /// Test network flag
    pub testnet: bool,
}

impl ChainDescriptor {
    /// Whether the given wallet kind may connect to this chain.
    pub fn supports(&self, kind: ProviderKind) -> bool {
        self.wallets.contains(&kind)
    }

    /// Explorer deep link for a transaction hash.
    pub fn explorer_tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{hash}", self.explorer_url)
    }

    /// Explorer deep link for an account address.
    pub fn explorer_address_url(&self, address: &str) -> String {
        format!("{}/address/{address}", self.explorer_url)
    }

    /// EIP-155 id formatted as the hex string wallets expect ("0x1").
    ///
    /// Returns `None` for non-EVM chains.
    pub fn evm_chain_id_hex(&self) -> Option<String> {
        self.evm_chain_id.map(|id| format!("0x{id:x}"))
    }
}

// ────────────────────────────────────────────
// Registry
// ────────────────────────────────────────────

/// Catalog of supported chains with deterministic ordering.
///
/// Lookups are pure and side-effect free; an unknown id is `None`, never an
/// error. `list` preserves catalog insertion order so UI/config consumers
/// see a stable sequence.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
}

impl ChainRegistry {
    /// Builds a registry from an explicit descriptor list.
    ///
    /// Later entries with a duplicate id are ignored; the first wins.
    pub fn new(descriptors: Vec<ChainDescriptor>) -> Self {
        let mut chains: Vec<ChainDescriptor> = Vec::with_capacity(descriptors.len());
        for desc in descriptors {
            if !chains.iter().any(|c| c.id == desc.id) {
                chains.push(desc);
            }
        }
        Self { chains }
    }

    /// Builds the registry with the built-in catalog.
    pub fn builtin() -> Self {
        Self::new(builtin_catalog())
    }

    /// Finds a descriptor by catalog id.
    pub fn lookup(&self, chain_id: &str) -> Option<&ChainDescriptor> {
        self.chains.iter().find(|c| c.id == chain_id)
    }

    /// Lists descriptors matching the filter, in catalog order.
    pub fn list(&self, filter: ChainFilter) -> Vec<&ChainDescriptor> {
        self.chains
            .iter()
            .filter(|c| match filter {
                ChainFilter::Mainnet => !c.testnet,
                ChainFilter::Testnet => c.testnet,
                ChainFilter::All => true,
            })
            .collect()
    }

    /// Number of chains in the catalog.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Built-in chain catalog.
///
/// RPC endpoints are public defaults; deployments override them via the
/// `[chains]` config section.
pub fn builtin_catalog() -> Vec<ChainDescriptor> {
    let evm_wallets = vec![ProviderKind::MetaMask, ProviderKind::CoinbaseWallet];
    vec![
        ChainDescriptor {
            id: "ethereum".to_string(),
            name: "Ethereum".to_string(),
            family: ChainFamily::Evm,
            evm_chain_id: Some(1),
            currency: NativeCurrency { symbol: "ETH".to_string(), decimals: 18 },
            rpc_url: "https://eth.llamarpc.com".to_string(),
            explorer_url: "https://etherscan.io".to_string(),
            wallets: evm_wallets.clone(),
            testnet: false,
        },
        ChainDescriptor {
            id: "polygon".to_string(),
            name: "Polygon".to_string(),
            family: ChainFamily::Evm,
            evm_chain_id: Some(137),
            currency: NativeCurrency { symbol: "MATIC".to_string(), decimals: 18 },
            rpc_url: "https://polygon-rpc.com".to_string(),
            explorer_url: "https://polygonscan.com".to_string(),
            wallets: evm_wallets.clone(),
            testnet: false,
        },
        ChainDescriptor {
            id: "arbitrum".to_string(),
            name: "Arbitrum One".to_string(),
            family: ChainFamily::Evm,
            evm_chain_id: Some(42161),
            currency: NativeCurrency { symbol: "ETH".to_string(), decimals: 18 },
            rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
            explorer_url: "https://arbiscan.io".to_string(),
            wallets: evm_wallets.clone(),
            testnet: false,
        },
        ChainDescriptor {
            id: "sepolia".to_string(),
            name: "Sepolia".to_string(),
            family: ChainFamily::Evm,
            evm_chain_id: Some(11_155_111),
            currency: NativeCurrency { symbol: "ETH".to_string(), decimals: 18 },
            rpc_url: "https://rpc.sepolia.org".to_string(),
            explorer_url: "https://sepolia.etherscan.io".to_string(),
            wallets: evm_wallets,
            testnet: true,
        },
        ChainDescriptor {
            id: "solana".to_string(),
            name: "Solana".to_string(),
            family: ChainFamily::Solana,
            evm_chain_id: None,
            currency: NativeCurrency { symbol: "SOL".to_string(), decimals: 9 },
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            explorer_url: "https://explorer.solana.com".to_string(),
            wallets: vec![ProviderKind::Phantom],
            testnet: false,
        },
        ChainDescriptor {
            id: "solana-devnet".to_string(),
            name: "Solana Devnet".to_string(),
            family: ChainFamily::Solana,
            evm_chain_id: None,
            currency: NativeCurrency { symbol: "SOL".to_string(), decimals: 9 },
            rpc_url: "https://api.devnet.solana.com".to_string(),
            explorer_url: "https://explorer.solana.com".to_string(),
            wallets: vec![ProviderKind::Phantom],
            testnet: true,
        },
    ]
}
