//! Context assembly: turns selected sources into the wire payload.
//!
//! The budget and citation policy are fixed per call and travel inside the
//! payload. Assembly never truncates upload text locally; an oversized
//! payload is logged and sent as-is.
//!
//! # Determinism
//!
//! Identical selections always produce identical payloads. Nothing here
//! depends on time or randomness.

use crate::selector::SelectedSources;
use crate::token;
use docpilot_core::context::ContextPayload;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Token budget sent with every request.
pub const DEFAULT_MAX_TOKENS: u32 = 12_000;

/// Whether the model must cite its sources.
pub const CITATION_REQUIRED: bool = true;

/// Context mode sent when none is configured.
pub const DEFAULT_MODE: &str = "chat";

/// The assembled payload plus what the assembler learned building it.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledContext {
    pub payload: ContextPayload,
    pub metadata: AssemblyMetadata,
}

/// Budget accounting for one assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// Estimated tokens of upload text.
    pub upload_tokens: usize,
    /// Token budget carried in the payload.
    pub budget: u32,
    /// Upload share of the budget (0.0 and up; may exceed 100).
    pub utilization_pct: f32,
    /// Uploads alone exceed the budget.
    pub over_budget: bool,
    pub uploads_included: usize,
}

/// Builds [`ContextPayload`]s from [`SelectedSources`].
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    mode: String,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MODE)
    }
}

impl ContextAssembler {
    pub fn new(mode: impl Into<String>) -> Self {
        Self { mode: mode.into() }
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Assemble the payload for one turn.
    ///
    /// Upload order is preserved exactly as selected. Pool flags are copied
    /// through unchanged; directory contents are resolved by the backend.
    pub fn assemble(&self, sources: &SelectedSources) -> AssembledContext {
        let payload = ContextPayload {
            uploads: sources.uploads.clone(),
            include_project: sources.include_project,
            include_reference: sources.include_reference,
            max_tokens: DEFAULT_MAX_TOKENS,
            citation_required: CITATION_REQUIRED,
            mode: self.mode.clone(),
        };

        let upload_tokens = token::estimate_upload_tokens(&payload.uploads);
        let budget = payload.max_tokens;
        let metadata = AssemblyMetadata {
            upload_tokens,
            budget,
            utilization_pct: if budget == 0 {
                0.0
            } else {
                (upload_tokens as f32 / budget as f32) * 100.0
            },
            over_budget: upload_tokens > budget as usize,
            uploads_included: payload.uploads.len(),
        };

        if metadata.over_budget {
            warn!(
                upload_tokens,
                budget, "Upload text exceeds the context budget; backend will truncate"
            );
        } else {
            debug!(
                upload_tokens,
                budget,
                uploads = metadata.uploads_included,
                project = payload.include_project,
                reference = payload.include_reference,
                "Context assembled"
            );
        }

        AssembledContext { payload, metadata }
    }
}
