//! Persistence Adapters - Key-Value Session Storage
//!
//! Implements the KeyValueStore port with an atomic JSON file store for
//! deployments and an in-memory store for tests and ephemeral hosts.
//! No database dependency — lightweight and crash-recoverable.

pub mod file_store;
pub mod memory;

pub use file_store::FileStore;
pub use memory::MemoryStore;
