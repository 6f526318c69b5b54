//! Time-bounded dismissal store.
//!
//! Two collections share the value key space but live independently in the
//! backing store: the durable detection log under `issues` (one entry per
//! unique value, insertion order) and the suppression list under
//! `dismissed` (at most one active record per value). Whether a value is
//! currently hidden from the user is never stored; it is derived by
//! joining the two collections at query time.

pub mod backend;
pub mod file;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::error::{Error, Result};

pub use backend::{KeyValueStore, MemoryStore};
pub use file::FileStore;

/// Backing-store key holding the detection log.
pub const ISSUES_KEY: &str = "issues";

/// Backing-store key holding the suppression list.
pub const DISMISSED_KEY: &str = "dismissed";

/// How long a dismissal keeps a value suppressed.
const SUPPRESSION_TTL_HOURS: i64 = 24;

/// A value from the durable detection log.
///
/// One entry exists per unique value; re-detection refreshes
/// `detected_at` in place. Entries are never deleted automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedIdentifier {
    /// The detected value (an email address).
    pub value: String,
    /// When the value was first seen, refreshed on every re-detection.
    pub detected_at: DateTime<Utc>,
}

/// A user dismissal of a detected value.
///
/// Active for [`suppression_ttl`] after `suppressed_at`; expired records
/// are lazily purged on the next read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// The dismissed value.
    pub value: String,
    /// When the user dismissed the value.
    pub suppressed_at: DateTime<Utc>,
}

impl Suppression {
    /// Check whether this suppression is still active at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.suppressed_at) < suppression_ttl()
    }
}

/// The fixed suppression window.
#[must_use]
pub fn suppression_ttl() -> Duration {
    Duration::hours(SUPPRESSION_TTL_HOURS)
}

/// Store for detections and their time-bounded dismissals.
///
/// All operations run against the backing [`KeyValueStore`]; read/write
/// failures propagate to the caller without retries.
#[derive(Clone)]
pub struct DismissalStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for DismissalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DismissalStore").finish_non_exhaustive()
    }
}

impl DismissalStore {
    /// Create a store over the given backend.
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Subscribe to backing-store change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<String>> {
        self.backend.subscribe()
    }

    /// Record a detection, refreshing its timestamp if the value is
    /// already logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub async fn record_detection(&self, value: &str) -> Result<()> {
        let mut issues = self.read_list::<DetectedIdentifier>(ISSUES_KEY).await?;
        let now = Utc::now();

        if let Some(existing) = issues.iter_mut().find(|issue| issue.value == value) {
            existing.detected_at = now;
            trace!(value, "detection timestamp refreshed");
        } else {
            issues.push(DetectedIdentifier {
                value: value.to_string(),
                detected_at: now,
            });
            debug!(value, "new detection logged");
        }

        self.write_list(ISSUES_KEY, &issues).await
    }

    /// Suppress a value for the fixed TTL, replacing any prior suppression
    /// for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub async fn suppress(&self, value: &str) -> Result<()> {
        let mut dismissed = self.read_list::<Suppression>(DISMISSED_KEY).await?;

        dismissed.retain(|s| s.value != value);
        dismissed.push(Suppression {
            value: value.to_string(),
            suppressed_at: Utc::now(),
        });

        debug!(value, "value suppressed");
        self.write_list(DISMISSED_KEY, &dismissed).await
    }

    /// Values whose suppression window has not yet elapsed.
    ///
    /// As a side effect, expired records found during the read are purged
    /// from the backing store (lazy compaction).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub async fn active_suppressions(&self) -> Result<Vec<String>> {
        let dismissed = self.read_list::<Suppression>(DISMISSED_KEY).await?;
        let now = Utc::now();

        let active: Vec<Suppression> = dismissed
            .iter()
            .filter(|s| s.is_active(now))
            .cloned()
            .collect();

        if active.len() != dismissed.len() {
            debug!(
                expired = dismissed.len() - active.len(),
                "compacting expired suppressions"
            );
            self.write_list(DISMISSED_KEY, &active).await?;
        }

        Ok(active.into_iter().map(|s| s.value).collect())
    }

    /// Logged detections whose value is not currently suppressed, in log
    /// order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub async fn active_detections(&self) -> Result<Vec<DetectedIdentifier>> {
        let issues = self.read_list::<DetectedIdentifier>(ISSUES_KEY).await?;
        let suppressed = self.active_suppressions().await?;

        Ok(issues
            .into_iter()
            .filter(|issue| !suppressed.contains(&issue.value))
            .collect())
    }

    /// The entire detection log, unfiltered, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub async fn all_detections(&self) -> Result<Vec<DetectedIdentifier>> {
        self.read_list(ISSUES_KEY).await
    }

    /// The raw suppression list, including records that may have expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub async fn suppressions(&self) -> Result<Vec<Suppression>> {
        self.read_list(DISMISSED_KEY).await
    }

    async fn read_list<T>(&self, key: &str) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut entries = self.backend.get(&[key]).await?;
        match entries.remove(key) {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| Error::store_corrupt(key, e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn write_list<T>(&self, key: &str, list: &[T]) -> Result<()>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(list)?;
        let entries: HashMap<String, Value> = HashMap::from([(key.to_string(), value)]);
        self.backend.set(entries).await
    }
}
