//! Error types for the docpilot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type; [`Error`] carries the four
//! failure kinds a chat session can observe.

use crate::directory::DirectoryPool;
use thiserror::Error;

/// Shown when a failure carries no usable detail.
pub const GENERIC_ERROR_MESSAGE: &str = "Unknown error";

/// The top-level error type for docpilot operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Per-file, recorded on the Document only ---
    #[error("Upload failed for {filename}: {reason}")]
    UploadFailed { filename: String, reason: String },

    // --- Health / model / directory fetches ---
    #[error("{probe} probe failed: {source}")]
    ProbeFailed {
        probe: ProbeKind,
        #[source]
        source: BackendError,
    },

    // --- Blocks submission, never narrated in the conversation ---
    #[error("Routing failed: {0}")]
    RoutingFailed(#[from] RoutingError),

    // --- Surfaces as an error-flagged assistant message ---
    #[error("Chat request failed: {0}")]
    ChatRequestFailed(#[source] BackendError),
}

impl Error {
    /// The human-readable message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::UploadFailed { reason, .. } => reason.clone(),
            Self::ProbeFailed { source, .. } | Self::ChatRequestFailed(source) => {
                source.user_message()
            }
            Self::RoutingFailed(e) => e.to_string(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Which background probe failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Health,
    Models,
    Directory(DirectoryPool),
    Refresh,
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Health => write!(f, "Health"),
            Self::Models => write!(f, "Model list"),
            Self::Directory(pool) => write!(f, "Directory ({pool})"),
            Self::Refresh => write!(f, "Directory refresh"),
        }
    }
}

// --- Bounded context errors ---

/// Errors reported by a [`Backend`](crate::backend::Backend) call.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Backend returned status {status_code}: {}", .detail.as_deref().unwrap_or(GENERIC_ERROR_MESSAGE))]
    Api {
        status_code: u16,
        detail: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// Reduce the error to a single message: the backend's detail when it
    /// sent one, otherwise the transport message, otherwise a generic text.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Api { detail, .. } => detail.as_deref().unwrap_or_default(),
            Self::Network(m) | Self::Timeout(m) | Self::InvalidResponse(m) => m.as_str(),
        };
        let message = message.trim();
        if message.is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("No model backend is available")]
    NoBackendAvailable,
}
