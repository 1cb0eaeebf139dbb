//! # docpilot Core
//!
//! Domain types, traits, and error definitions for the docpilot document
//! chat client. This crate has **no transport dependencies**: it defines the
//! domain model (documents, directory snapshots, conversations, model
//! health) and the [`Backend`] trait the other crates implement against.

pub mod backend;
pub mod context;
pub mod directory;
pub mod document;
pub mod error;
pub mod message;
pub mod model;
pub mod version;

// Re-export key types at crate root for ergonomics
pub use backend::{Backend, ChatReply, ChatRequest, UploadReply};
pub use context::{ContextPayload, UploadSource};
pub use directory::{DirectoryPool, DirectorySnapshot, FileEntry, VersionStats};
pub use document::{Document, DocumentId, DocumentList, DocumentStatus};
pub use error::{BackendError, Error, ProbeKind, Result, RoutingError};
pub use message::{Citation, Conversation, ConversationMessage, Role, Usage};
pub use model::{BackendKind, HealthStatus, ModelDescriptor, OverallStatus};
pub use version::{Revision, VersionClassifier, VersionInfo, VersionType};
