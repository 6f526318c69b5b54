//! Error types for sendguard.
//!
//! Every fallible operation in the crate returns the [`Error`] type defined
//! here. The design goal is that no failure may break the host page the
//! monitor observes: callers log and degrade rather than panic.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for sendguard operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Backing store errors ===
    /// Reading from the backing key-value store failed.
    #[error("backing store read failed: {0}")]
    StoreRead(String),

    /// Writing to the backing key-value store failed.
    #[error("backing store write failed: {0}")]
    StoreWrite(String),

    /// A persisted record could not be decoded.
    #[error("corrupt store record under key '{key}': {message}")]
    StoreCorrupt {
        /// The top-level key holding the bad data.
        key: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Monitor errors ===
    /// The editable surface never appeared within the discovery window.
    #[error("editor surface not found after {waited_ms}ms")]
    EditorNotFound {
        /// How long discovery polled before giving up, in milliseconds.
        waited_ms: u64,
    },

    /// A channel the monitor depends on closed unexpectedly.
    #[error("channel '{channel}' closed")]
    ChannelClosed {
        /// Name of the channel that closed.
        channel: &'static str,
    },

    // === I/O errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for sendguard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new backing-store read error.
    #[must_use]
    pub fn store_read(message: impl Into<String>) -> Self {
        Self::StoreRead(message.into())
    }

    /// Create a new backing-store write error.
    #[must_use]
    pub fn store_write(message: impl Into<String>) -> Self {
        Self::StoreWrite(message.into())
    }

    /// Create a corrupt-record error for the given store key.
    #[must_use]
    pub fn store_corrupt(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreCorrupt {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error came from the backing store.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::StoreRead(_) | Self::StoreWrite(_) | Self::StoreCorrupt { .. }
        )
    }

    /// Check if this error indicates the editor surface was never found.
    #[must_use]
    pub fn is_editor_not_found(&self) -> bool {
        matches!(self, Self::EditorNotFound { .. })
    }
}
