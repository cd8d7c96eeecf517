//! File Store - Atomic JSON Key-Value Persistence
//!
//! Implements the `KeyValueStore` port over a single JSON document using
//! atomic writes (write to tmp file, then rename). This guarantees crash
//! safety and prevents partial writes from corrupting the session
//! snapshot. Entries are cached in memory and written through on every
//! mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::ports::store::KeyValueStore;

/// Atomic JSON-backed key-value store.
///
/// The document is written to a temporary file first, then atomically
/// renamed, so on disk it is always either the old or the new version,
/// never a partial write.
pub struct FileStore {
    /// Path to store.json.
    file_path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
    /// Write-through cache of the document.
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or create) a store in the given data directory.
    ///
    /// Creates the directory if it doesn't exist and loads any existing
    /// document. An unreadable document is treated as empty with a
    /// warning rather than refusing to start.
    pub async fn new(data_dir: &str) -> Result<Self> {
        let dir = Path::new(data_dir);
        fs::create_dir_all(dir)
            .await
            .context("Failed to create data directory")?;

        let file_path = dir.join("store.json");
        let tmp_path = dir.join("store.json.tmp");

        let entries = if file_path.exists() {
            let json = fs::read_to_string(&file_path)
                .await
                .context("Failed to read store file")?;
            match serde_json::from_str::<HashMap<String, String>>(&json) {
                Ok(entries) => {
                    info!(
                        path = %file_path.display(),
                        keys = entries.len(),
                        "Store loaded"
                    );
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "Store file unreadable, starting empty");
                    HashMap::new()
                }
            }
        } else {
            debug!("No store file found, starting fresh");
            HashMap::new()
        };

        Ok(Self {
            file_path,
            tmp_path,
            entries: Mutex::new(entries),
        })
    }

    /// Write the full document atomically (tmp → rename).
    async fn flush(&self, entries: &HashMap<String, String>) -> Result<()> {
        let json =
            serde_json::to_string_pretty(entries).context("Failed to serialize store")?;

        fs::write(&self.tmp_path, &json)
            .await
            .context("Failed to write tmp store file")?;

        fs::rename(&self.tmp_path, &self.file_path)
            .await
            .context("Failed to rename store file")?;

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    #[instrument(skip(self, value))]
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        if !self.file_path.exists() {
            return true; // First run is OK
        }
        fs::metadata(&self.file_path).await.is_ok()
    }
}
