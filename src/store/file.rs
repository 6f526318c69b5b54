//! JSON-file backing store.
//!
//! Persistence adapter used by the `sendguard` CLI: the whole key space is
//! kept as a single JSON document on disk, loaded at open and rewritten on
//! every `set`. Change notifications are in-process only.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::backend::KeyValueStore;

const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// File-backed key-value store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<Vec<String>>,
}

impl FileStore {
    /// Open or create a store document at the given path.
    ///
    /// Creates parent directories if they don't exist. A missing document
    /// reads as an empty key space.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created or an existing
    /// document cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let entries = if path.exists() {
            debug!("loading store document from {}", path.display());
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| Error::store_read(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&raw)
                .map_err(|e| Error::store_read(format!("{}: {e}", path.display())))?
        } else {
            HashMap::new()
        };

        info!("store document opened at {}", path.display());
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            entries: RwLock::new(entries),
            changes,
        })
    }

    /// Get the path to the store document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, Value>) -> Result<()> {
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)
            .map_err(|e| Error::store_write(format!("{}: {e}", self.path.display())))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| ((*key).to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_entries: HashMap<String, Value>) -> Result<()> {
        let changed: Vec<String> = new_entries.keys().cloned().collect();

        let mut entries = self.entries.write().await;
        entries.extend(new_entries);
        self.persist(&entries)?;
        drop(entries);

        let _ = self.changes.send(changed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<String>> {
        self.changes.subscribe()
    }
}
