//! Presentation-facing aggregates over the dismissal store.
//!
//! The gate owns no state of its own: every summary is recomputed from the
//! store, either on explicit request or whenever the backing store reports
//! that another consumer changed one of the two relevant keys.

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::error::Result;
use crate::store::{DetectedIdentifier, DismissalStore, DISMISSED_KEY, ISSUES_KEY};

/// Aggregates consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateSummary {
    /// Total number of values ever detected.
    pub total_detected: usize,
    /// Number of values whose suppression window has not elapsed.
    pub currently_dismissed: usize,
    /// Detections not currently suppressed, in log order.
    pub active_issues: Vec<DetectedIdentifier>,
    /// The entire detection log.
    pub all_issues: Vec<DetectedIdentifier>,
}

/// Gate between the dismissal store and the presentation layer.
#[derive(Debug, Clone)]
pub struct NotificationGate {
    store: DismissalStore,
}

impl NotificationGate {
    /// Create a gate over the given store.
    #[must_use]
    pub fn new(store: DismissalStore) -> Self {
        Self { store }
    }

    /// Recompute the presentation aggregates from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub async fn summary(&self) -> Result<GateSummary> {
        let all_issues = self.store.all_detections().await?;
        let active_issues = self.store.active_detections().await?;
        let currently_dismissed = self.store.active_suppressions().await?.len();

        Ok(GateSummary {
            total_detected: all_issues.len(),
            currently_dismissed,
            active_issues,
            all_issues,
        })
    }

    /// Dismiss a value for the suppression window.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    pub async fn dismiss(&self, value: &str) -> Result<()> {
        self.store.suppress(value).await
    }

    /// Forward a fresh summary on `tx` whenever the backing store reports
    /// a change to one of the two persisted keys.
    ///
    /// Runs until the change subscription or `tx` closes. Summaries are
    /// never cached across a change signal; store failures during a
    /// recompute are logged and skipped.
    pub async fn watch(self, tx: mpsc::Sender<GateSummary>) {
        let mut changes = self.store.subscribe();

        loop {
            match changes.recv().await {
                Ok(keys) => {
                    if !keys.iter().any(|k| k == ISSUES_KEY || k == DISMISSED_KEY) {
                        continue;
                    }
                    match self.summary().await {
                        Ok(summary) => {
                            if tx.send(summary).await.is_err() {
                                debug!("summary receiver dropped, watch stopping");
                                return;
                            }
                        }
                        Err(e) => warn!(error = %e, "summary refresh failed"),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Dropped notifications only mean we recompute once
                    // instead of `missed` times.
                    debug!(missed, "change notifications lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("change subscription closed, watch stopping");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::backend::KeyValueStore;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn gate() -> (NotificationGate, DismissalStore, Arc<MemoryStore>) {
        let backend = Arc::new(MemoryStore::new());
        let store = DismissalStore::new(backend.clone());
        (NotificationGate::new(store.clone()), store, backend)
    }

    #[tokio::test]
    async fn test_summary_empty() {
        let (gate, _, _) = gate();

        let summary = gate.summary().await.unwrap();
        assert_eq!(summary.total_detected, 0);
        assert_eq!(summary.currently_dismissed, 0);
        assert!(summary.active_issues.is_empty());
        assert!(summary.all_issues.is_empty());
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let (gate, store, _) = gate();

        store.record_detection("a@b.com").await.unwrap();
        store.record_detection("c@d.com").await.unwrap();
        store.suppress("a@b.com").await.unwrap();

        let summary = gate.summary().await.unwrap();
        assert_eq!(summary.total_detected, 2);
        assert_eq!(summary.currently_dismissed, 1);
        assert_eq!(summary.active_issues.len(), 1);
        assert_eq!(summary.active_issues[0].value, "c@d.com");
        assert_eq!(summary.all_issues.len(), 2);
    }

    #[tokio::test]
    async fn test_dismiss_hides_value() {
        let (gate, store, _) = gate();

        store.record_detection("a@b.com").await.unwrap();
        gate.dismiss("a@b.com").await.unwrap();

        let summary = gate.summary().await.unwrap();
        assert!(summary.active_issues.is_empty());
        assert_eq!(summary.total_detected, 1);
        assert_eq!(summary.currently_dismissed, 1);
    }

    #[tokio::test]
    async fn test_watch_refreshes_on_relevant_change() {
        let (gate, store, _) = gate();
        let (tx, mut rx) = mpsc::channel(8);

        let watcher = tokio::spawn(gate.watch(tx));
        // Let the watcher subscribe before the first write.
        tokio::task::yield_now().await;

        store.record_detection("a@b.com").await.unwrap();

        let summary = timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("no summary received")
            .unwrap();
        assert_eq!(summary.total_detected, 1);

        drop(rx);
        store.record_detection("b@c.com").await.unwrap();
        let _ = timeout(Duration::from_millis(200), watcher).await;
    }

    #[tokio::test]
    async fn test_watch_ignores_unrelated_keys() {
        let (gate, _, backend) = gate();
        let (tx, mut rx) = mpsc::channel(8);

        tokio::spawn(gate.watch(tx));
        tokio::task::yield_now().await;

        backend
            .set(HashMap::from([(
                "unrelated".to_string(),
                serde_json::json!(42),
            )]))
            .await
            .unwrap();

        let result = timeout(Duration::from_millis(60), rx.recv()).await;
        assert!(result.is_err(), "unexpected summary: {result:?}");
    }

    #[tokio::test]
    async fn test_summary_serializes_for_presentation() {
        let (gate, store, _) = gate();
        store.record_detection("a@b.com").await.unwrap();

        let summary = gate.summary().await.unwrap();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["total_detected"], 1);
        assert_eq!(json["all_issues"][0]["value"], "a@b.com");
    }
}
