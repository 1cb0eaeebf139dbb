//! HTTP backend for docpilot.
//!
//! Implements the `docpilot_core::Backend` trait against the document/chat
//! service's REST API. [`build_from_config`] creates a client from the
//! application configuration.

pub mod http;
mod wire;

pub use http::{HttpBackend, build_from_config};
