//! Backing key-value store abstraction.
//!
//! The dismissal store persists through an asynchronous key-value store
//! with change notifications. The transport is an external collaborator;
//! this module defines the trait plus an in-process implementation used
//! for embedding and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::trace;

use crate::error::Result;

/// Capacity of the change-notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// An asynchronous key-value store with change notifications.
///
/// `get` returns a partial map containing only the requested keys that are
/// present; `set` upserts the given entries atomically per call and then
/// notifies subscribers with the set of changed keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the values stored under `keys`. Missing keys are simply absent
    /// from the returned map.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Upsert `entries` into the store.
    async fn set(&self, entries: HashMap<String, Value>) -> Result<()>;

    /// Subscribe to change notifications. Each message carries the names of
    /// the keys changed by one `set` call.
    fn subscribe(&self) -> broadcast::Receiver<Vec<String>>;
}

/// In-process key-value store.
///
/// Used by tests and by embedders that do not need persistence across
/// restarts.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    changes: broadcast::Sender<Vec<String>>,
}

impl MemoryStore {
    /// Create an empty in-process store.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            changes,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| ((*key).to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, new_entries: HashMap<String, Value>) -> Result<()> {
        let changed: Vec<String> = new_entries.keys().cloned().collect();
        {
            let mut entries = self.entries.write().await;
            entries.extend(new_entries);
        }

        trace!(keys = ?changed, "memory store updated");
        // No receivers is fine; notification is best-effort.
        let _ = self.changes.send(changed);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<String>> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing_keys_absent() {
        let store = MemoryStore::new();
        let result = store.get(&["issues", "dismissed"]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([("issues".to_string(), json!([1, 2]))]))
            .await
            .unwrap();

        let result = store.get(&["issues"]).await.unwrap();
        assert_eq!(result.get("issues"), Some(&json!([1, 2])));
    }

    #[tokio::test]
    async fn test_get_is_partial() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([("issues".to_string(), json!([]))]))
            .await
            .unwrap();

        let result = store.get(&["issues", "dismissed"]).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("issues"));
        assert!(!result.contains_key("dismissed"));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([("issues".to_string(), json!("old"))]))
            .await
            .unwrap();
        store
            .set(HashMap::from([("issues".to_string(), json!("new"))]))
            .await
            .unwrap();

        let result = store.get(&["issues"]).await.unwrap();
        assert_eq!(result.get("issues"), Some(&json!("new")));
    }

    #[tokio::test]
    async fn test_subscribe_receives_changed_keys() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();

        store
            .set(HashMap::from([("dismissed".to_string(), json!([]))]))
            .await
            .unwrap();

        let changed = rx.recv().await.unwrap();
        assert_eq!(changed, vec!["dismissed".to_string()]);
    }

    #[tokio::test]
    async fn test_set_without_subscribers_is_ok() {
        let store = MemoryStore::new();
        let result = store
            .set(HashMap::from([("issues".to_string(), json!([]))]))
            .await;
        assert!(result.is_ok());
    }
}
