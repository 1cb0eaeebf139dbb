//! Uploaded documents.
//!
//! A document is created when its upload completes, successfully or not.
//! Failed uploads stay in the list so the user can see why they failed, but
//! only processed documents ever reach a context payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processed,
    Error,
}

/// An uploaded document and its extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    /// Extracted text; empty for failed uploads.
    pub content: String,
    pub size_bytes: u64,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Document {
    pub fn processed(name: impl Into<String>, content: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            content: content.into(),
            size_bytes,
            status: DocumentStatus::Processed,
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, size_bytes: u64, error: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            name: name.into(),
            content: String::new(),
            size_bytes,
            status: DocumentStatus::Error,
            error: Some(error.into()),
        }
    }

    pub fn is_processed(&self) -> bool {
        self.status == DocumentStatus::Processed
    }
}

/// The session's uploads, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct DocumentList {
    documents: Vec<Document>,
}

impl DocumentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, document: Document) {
        self.documents.push(document);
    }

    /// Remove a document by id. Returns the removed document, if any.
    pub fn remove(&mut self, id: &DocumentId) -> Option<Document> {
        let idx = self.documents.iter().position(|d| &d.id == id)?;
        Some(self.documents.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Processed documents only, in insertion order.
    pub fn processed(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|d| d.is_processed())
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
