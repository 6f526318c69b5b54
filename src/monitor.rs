//! Submission monitoring for the host composer.
//!
//! The monitor observes host-page events for signals that the user is
//! about to submit composed text, keeps a capture buffer of the most
//! recent non-empty extraction, and runs the detection pipeline when a
//! submit intent fires. Findings that survive the dismissal store's
//! suppression filter are emitted as alerts for the presentation layer.
//!
//! Lifecycle is deliberately simple: `Uninitialized -> Watching`, with no
//! detach path. If the editable surface is removed from the page later,
//! the monitor keeps observing a surface that yields nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::detect::EmailDetector;
use crate::error::{Error, Result};
use crate::extract::{extract_text, Node};
use crate::store::DismissalStore;

/// A live editable surface on the host page.
///
/// `snapshot` returns the current content tree, or `None` while the
/// editor has not (yet) appeared in the host document.
pub trait EditorSurface: Send + Sync {
    /// Take a snapshot of the editable-content tree.
    fn snapshot(&self) -> Option<Node>;
}

/// A host-page event delivered to the monitor.
#[derive(Debug, Clone)]
pub enum PageEvent {
    /// The editable surface's content changed.
    Input,
    /// A global click anywhere in the host document.
    Click(ClickTarget),
    /// A key press while some element has focus.
    KeyPress(KeyPress),
    /// A form-submit event on the host document.
    FormSubmit(FormMarker),
}

/// The target of a click event, described by element ids.
#[derive(Debug, Clone, Default)]
pub struct ClickTarget {
    /// Id of the clicked element, if it has one.
    pub target_id: Option<String>,
    /// Ids of the target's ancestors, nearest first.
    pub ancestor_ids: Vec<String>,
}

impl ClickTarget {
    /// Check whether the target is, or is contained by, the element with
    /// the given id.
    #[must_use]
    pub fn is_within(&self, id: &str) -> bool {
        self.target_id.as_deref() == Some(id) || self.ancestor_ids.iter().any(|a| a == id)
    }
}

/// A key press observed on the host page.
#[derive(Debug, Clone)]
pub struct KeyPress {
    /// Which key was pressed.
    pub key: Key,
    /// Whether the shift modifier was held.
    pub shift: bool,
    /// Whether focus was in the editable surface.
    pub editor_focused: bool,
}

/// Keys the monitor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// The primary activation key.
    Enter,
    /// Any other key.
    Other,
}

/// Structural markers of a submitted form.
#[derive(Debug, Clone, Default)]
pub struct FormMarker {
    /// The form's class list.
    pub classes: Vec<String>,
    /// The form's `data-type` attribute, if present.
    pub data_type: Option<String>,
}

/// An alert carrying detected values that are not currently suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// The alertable values, in detection-log order.
    pub values: Vec<String>,
}

/// Shared "is an alert currently visible" flag.
///
/// Cloneable so the presentation layer can clear it when the user closes
/// the alert. The flag is checked when a scheduled emission fires, not
/// when it is scheduled, so a stale timer degrades to a no-op.
#[derive(Debug, Clone, Default)]
pub struct AlertGuard {
    visible: Arc<AtomicBool>,
}

impl AlertGuard {
    /// Create a new guard with no alert visible.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to mark an alert visible. Returns `false` if one already is.
    #[must_use]
    pub fn try_raise(&self) -> bool {
        self.visible
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Mark the alert closed.
    pub fn dismiss(&self) {
        self.visible.store(false, Ordering::SeqCst);
    }

    /// Check whether an alert is currently visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

/// Lifecycle state of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// The editable surface has not been located yet.
    Uninitialized,
    /// The monitor is watching host-page events. Never reverts.
    Watching,
}

/// Event-driven monitor that turns submit intent into detection checks.
pub struct SubmissionMonitor {
    config: Config,
    surface: Arc<dyn EditorSurface>,
    store: DismissalStore,
    detector: EmailDetector,
    state: MonitorState,
    capture_buffer: String,
    alert_guard: AlertGuard,
    alerts: mpsc::Sender<Alert>,
}

impl std::fmt::Debug for SubmissionMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionMonitor")
            .field("state", &self.state)
            .field("capture_buffer_len", &self.capture_buffer.len())
            .finish_non_exhaustive()
    }
}

impl SubmissionMonitor {
    /// Create a monitor over the given surface and store.
    ///
    /// Alerts that survive the suppression filter are sent on `alerts`
    /// after the configured delay.
    #[must_use]
    pub fn new(
        config: Config,
        surface: Arc<dyn EditorSurface>,
        store: DismissalStore,
        alerts: mpsc::Sender<Alert>,
    ) -> Self {
        Self {
            config,
            surface,
            store,
            detector: EmailDetector::new(),
            state: MonitorState::Uninitialized,
            capture_buffer: String::new(),
            alert_guard: AlertGuard::new(),
            alerts,
        }
    }

    /// The monitor's lifecycle state.
    #[must_use]
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The most recently captured non-empty text.
    #[must_use]
    pub fn captured_text(&self) -> &str {
        &self.capture_buffer
    }

    /// A handle to the single-visible-alert flag, for the presentation
    /// layer to clear when the user closes the alert.
    #[must_use]
    pub fn alert_guard(&self) -> AlertGuard {
        self.alert_guard.clone()
    }

    /// Wait for the editable surface to appear, then transition to
    /// `Watching`.
    ///
    /// Polls at the configured interval. Discovery is bounded: once the
    /// configured timeout elapses the monitor halts with
    /// [`Error::EditorNotFound`] instead of spinning forever on a page
    /// that will never grow the editor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EditorNotFound`] if the surface never appears
    /// within the discovery window.
    pub async fn attach(&mut self) -> Result<()> {
        if self.state == MonitorState::Watching {
            return Ok(());
        }

        let started = Instant::now();
        let deadline = started + self.config.discovery_timeout();

        loop {
            if self.surface.snapshot().is_some() {
                self.state = MonitorState::Watching;
                info!("editor surface found, watching for submit intent");
                return Ok(());
            }

            if Instant::now() >= deadline {
                let waited_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                warn!(waited_ms, "editor surface never appeared");
                return Err(Error::EditorNotFound { waited_ms });
            }

            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// Attach, then process host events until the event channel closes.
    ///
    /// Store failures during event handling are logged and swallowed so
    /// the host page is never disturbed; only a failed attach is terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the editable surface is never found.
    pub async fn run(mut self, mut events: mpsc::Receiver<PageEvent>) -> Result<()> {
        self.attach().await?;

        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event).await {
                warn!(error = %e, "submission check failed");
            }
        }

        debug!("event channel closed, monitor stopping");
        Ok(())
    }

    /// React to one host-page event.
    ///
    /// # Errors
    ///
    /// Returns an error if a triggered submission check fails against the
    /// backing store.
    pub async fn handle_event(&mut self, event: PageEvent) -> Result<()> {
        if self.state != MonitorState::Watching {
            trace!("event ignored before attach");
            return Ok(());
        }

        match event {
            PageEvent::Input => {
                self.capture();
                Ok(())
            }
            PageEvent::Click(target) => {
                if target.is_within(&self.config.selectors.overlay_container) {
                    // Clicks inside our own overlay are never host-page
                    // activity, even if a selector also matches.
                    trace!("self-click ignored");
                    return Ok(());
                }
                if target.is_within(&self.config.selectors.submit_control) {
                    self.capture();
                    return self.submit().await;
                }
                Ok(())
            }
            PageEvent::KeyPress(press) => {
                if press.key == Key::Enter && !press.shift && press.editor_focused {
                    self.capture();
                    return self.submit().await;
                }
                Ok(())
            }
            PageEvent::FormSubmit(marker) => {
                if self.is_composer_form(&marker) {
                    self.capture();
                    return self.submit().await;
                }
                Ok(())
            }
        }
    }

    fn is_composer_form(&self, marker: &FormMarker) -> bool {
        marker
            .classes
            .iter()
            .any(|c| c == &self.config.selectors.composer_form_class)
            || marker.data_type.as_deref()
                == Some(self.config.selectors.composer_form_data_type.as_str())
    }

    /// Re-extract the current text into the capture buffer.
    ///
    /// The buffer only ever holds non-empty trimmed text: a missing
    /// surface or whitespace-only extraction leaves it untouched.
    fn capture(&mut self) {
        let Some(root) = self.surface.snapshot() else {
            return;
        };

        let text = extract_text(&root);
        let text = text.trim();
        if !text.is_empty() {
            self.capture_buffer = text.to_string();
        }
    }

    /// The submission procedure: detect, record, filter, schedule.
    async fn submit(&mut self) -> Result<()> {
        if self.capture_buffer.is_empty() {
            return Ok(());
        }

        let detection = self.detector.detect(&self.capture_buffer);
        if !detection.found {
            return Ok(());
        }

        // Upserts keyed by value make redundant triggers for one logical
        // submission refresh timestamps instead of duplicating entries.
        for value in &detection.values {
            self.store.record_detection(value).await?;
        }

        let active = self.store.active_detections().await?;
        let alertable: Vec<String> = active
            .into_iter()
            .filter(|issue| detection.values.contains(&issue.value))
            .map(|issue| issue.value)
            .collect();

        if alertable.is_empty() {
            debug!("all detected values currently suppressed");
            return Ok(());
        }

        self.schedule_alert(alertable);
        Ok(())
    }

    /// Schedule a single alert emission after the configured delay.
    ///
    /// The delay is not cancelable; the guard absorbs a stale timer by
    /// checking visibility at fire time.
    fn schedule_alert(&self, values: Vec<String>) {
        let guard = self.alert_guard.clone();
        let alerts = self.alerts.clone();
        let delay = self.config.alert_delay();

        debug!(count = values.len(), "alert scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            if !guard.try_raise() {
                trace!("alert already visible, emission skipped");
                return;
            }

            if alerts.send(Alert { values }).await.is_err() {
                guard.dismiss();
                warn!("alert channel closed, emission dropped");
            }
        });
    }
}
