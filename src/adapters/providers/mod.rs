//! Wallet Provider Adapters
//!
//! Concrete implementations of the `WalletProvider` port.

pub mod unattended;

pub use unattended::UnattendedProvider;
