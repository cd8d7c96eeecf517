//! Memory Store - Ephemeral Key-Value Backend
//!
//! In-process implementation of the `KeyValueStore` port for tests and
//! hosts without durable storage. Contents vanish with the process.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::store::KeyValueStore;

/// HashMap-backed store with no persistence.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            store.put("k", "v").await.unwrap();
            assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
            store.remove("k").await.unwrap();
            assert!(store.get("k").await.unwrap().is_none());
            assert!(store.is_healthy().await);
        });
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("absent").await.unwrap().is_none());
        store.remove("absent").await.unwrap();
    }
}
