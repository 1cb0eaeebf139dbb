//! Backend trait: the abstraction over the document/chat service.
//!
//! The core never speaks HTTP itself. Everything it needs from the outside
//! world goes through these six operations; `docpilot-client` implements
//! them over HTTP, tests implement them with scripted mocks.

use crate::context::ContextPayload;
use crate::directory::{DirectoryPool, DirectorySnapshot};
use crate::error::BackendError;
use crate::message::{Citation, Usage};
use crate::model::{BackendKind, HealthStatus, ModelDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One chat turn as sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub backend: BackendKind,
    pub context: ContextPayload,
}

/// The backend's answer to a chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub model: String,
    pub llm_type: BackendKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

/// The backend's answer to an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReply {
    pub filename: String,
    pub content: String,
    pub size_bytes: u64,
    /// Whether the backend reports the text as extracted.
    pub processed: bool,
}

/// The core Backend trait.
///
/// Every operation is a single attempt; callers never retry automatically.
#[async_trait]
pub trait Backend: Send + Sync {
    /// A human-readable name for this backend (e.g. its base URL).
    fn name(&self) -> &str;

    /// Probe which model backends are currently reachable.
    async fn health(&self) -> Result<HealthStatus, BackendError>;

    /// List the model inventory, in the backend's order.
    async fn models(&self) -> Result<Vec<ModelDescriptor>, BackendError>;

    /// Fetch the current snapshot of one directory pool.
    async fn directory(&self, pool: DirectoryPool) -> Result<DirectorySnapshot, BackendError>;

    /// Ask the backend to rescan both directory pools.
    async fn refresh_directories(&self) -> Result<(), BackendError>;

    /// Upload one file and get its extracted text back.
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadReply, BackendError>;

    /// Run one chat turn.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, BackendError>;
}
