//! `sendguard` - pre-submission detection of sensitive identifiers
//!
//! This library watches text a user composes in a third-party chat
//! composer, detects email addresses before the text is sent, and lets
//! the user suppress repeat warnings for a 24-hour window. Detection is
//! advisory: nothing is redacted or blocked, and no failure may disturb
//! the host page.
//!
//! The host page, the presentation widgets, and the persistence transport
//! are external collaborators behind small seams: an
//! [`monitor::EditorSurface`] yields content-tree snapshots, host events
//! arrive as plain [`monitor::PageEvent`] data, and persistence goes
//! through the async [`store::KeyValueStore`] trait.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod gate;
pub mod logging;
pub mod monitor;
pub mod store;

pub use config::Config;
pub use detect::{Detection, EmailDetector};
pub use error::{Error, Result};
pub use extract::{extract_text, Node};
pub use gate::{GateSummary, NotificationGate};
pub use logging::init_logging;
pub use monitor::{Alert, AlertGuard, PageEvent, SubmissionMonitor};
pub use store::{DetectedIdentifier, DismissalStore, FileStore, MemoryStore, Suppression};
