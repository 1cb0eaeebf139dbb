//! Model router: picks the backend kind for each turn.
//!
//! Availability is re-checked against the latest [`HealthStatus`] on every
//! call to [`ModelRouter::resolve`]. The router never hands out a backend the
//! health probe reports as unavailable.

use docpilot_core::error::RoutingError;
use docpilot_core::model::{BackendKind, HealthStatus};
use tracing::{debug, info};

/// Tracks the preferred backend and resolves it against live health.
#[derive(Debug, Clone, Default)]
pub struct ModelRouter {
    preference: Option<BackendKind>,
    /// Set once the user (or config) chose explicitly; probes stop
    /// overwriting the preference from then on.
    pinned: bool,
}

impl ModelRouter {
    /// Create a router, optionally pinned to a configured backend.
    pub fn new(configured: Option<BackendKind>) -> Self {
        Self {
            preference: configured,
            pinned: configured.is_some(),
        }
    }

    pub fn preference(&self) -> Option<BackendKind> {
        self.preference
    }

    /// Adopt the probe's default backend unless the user already chose one.
    pub fn on_health_probe(&mut self, health: &HealthStatus) {
        if !self.pinned {
            self.preference = Some(health.default_backend);
            debug!(backend = %health.default_backend, "Preference initialised from health probe");
        }
    }

    /// Explicit user choice. Takes effect on the next turn.
    pub fn set_preference(&mut self, kind: BackendKind) {
        self.preference = Some(kind);
        self.pinned = true;
        info!(backend = %kind, "Backend preference set");
    }

    /// Resolve the backend for one turn.
    ///
    /// Uses `requested` when given, otherwise the stored preference, otherwise
    /// the probe's default. Falls back to the other kind when the chosen one
    /// is down.
    pub fn resolve(
        &self,
        health: &HealthStatus,
        requested: Option<BackendKind>,
    ) -> Result<BackendKind, RoutingError> {
        let wanted = requested
            .or(self.preference)
            .unwrap_or(health.default_backend);

        if health.is_available(wanted) {
            return Ok(wanted);
        }

        let fallback = wanted.other();
        if health.is_available(fallback) {
            info!(wanted = %wanted, using = %fallback, "Preferred backend unavailable, falling back");
            return Ok(fallback);
        }

        Err(RoutingError::NoBackendAvailable)
    }
}
