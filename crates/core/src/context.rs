//! The assembled context payload sent with every chat turn.
//!
//! A payload is a pure value: built by the assembler, handed to the backend,
//! then discarded when the turn ends.

use serde::{Deserialize, Serialize};

/// An upload embedded literally in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSource {
    pub name: String,
    pub content: String,
}

/// Everything the backend needs to ground one answer.
///
/// Uploads are listed in insertion order; that order is the citation order
/// the backend uses. Project and reference pools are declared by flag and
/// resolved server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPayload {
    pub uploads: Vec<UploadSource>,
    pub include_project: bool,
    pub include_reference: bool,
    pub max_tokens: u32,
    pub citation_required: bool,
    pub mode: String,
}

impl ContextPayload {
    /// True when the payload declares no source at all.
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && !self.include_project && !self.include_reference
    }
}
