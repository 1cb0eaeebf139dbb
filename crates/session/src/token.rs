//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token, rounded up.
//! Only used to report budget utilization. The backend owns truncation.

use docpilot_core::context::UploadSource;

/// Estimate the token count for a string.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Estimate tokens for the extracted text of the given uploads.
pub fn estimate_upload_tokens(uploads: &[UploadSource]) -> usize {
    uploads.iter().map(|u| estimate_tokens(&u.content)).sum()
}
