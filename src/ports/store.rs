//! Store Port - Session Persistence Interface
//!
//! String key-value storage for the persisted session snapshot, mirroring
//! the browser-localStorage shape the connection registry was designed
//! around. The host supplies the durable backend; a file-backed and an
//! in-memory adapter ship with the crate.

use async_trait::async_trait;

/// Trait for durable key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
  /// Store `value` under `key`, replacing any previous value.
  async fn put(&self, key: &str, value: &str) -> anyhow::Result<()>;

  /// Fetch the value under `key`, `None` when absent.
  async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

  /// Delete `key`; deleting an absent key is not an error.
  async fn remove(&self, key: &str) -> anyhow::Result<()>;

  /// Check if the store is healthy (disk space, permissions).
  async fn is_healthy(&self) -> bool;
}
