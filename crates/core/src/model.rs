//! Model backends, their inventory and live health.

use serde::{Deserialize, Serialize};

/// Where a model runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// A model served on the local machine (Ollama).
    Local,
    /// A hosted model (Claude).
    Cloud,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }

    /// The other backend.
    pub fn other(&self) -> Self {
        match self {
            Self::Local => Self::Cloud,
            Self::Cloud => Self::Local,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "ollama" => Ok(Self::Local),
            "cloud" | "claude" => Ok(Self::Cloud),
            other => Err(format!("unknown backend '{other}' (expected 'local' or 'cloud')")),
        }
    }
}

/// One entry of the model inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BackendKind,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Models of one backend kind, in probe order.
pub fn models_of_kind(
    models: &[ModelDescriptor],
    kind: BackendKind,
) -> impl Iterator<Item = &ModelDescriptor> {
    models.iter().filter(move |m| m.kind == kind)
}

/// A backend kind can be picked when at least one of its models is available.
pub fn kind_selectable(models: &[ModelDescriptor], kind: BackendKind) -> bool {
    models_of_kind(models, kind).any(|m| m.available)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Error,
}

/// Result of a health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub overall: OverallStatus,
    pub local_available: bool,
    pub cloud_available: bool,
    pub default_backend: BackendKind,
    /// Human-readable note, set when the probe itself failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthStatus {
    /// The state assumed when the backend could not be reached at all.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            overall: OverallStatus::Error,
            local_available: false,
            cloud_available: false,
            default_backend: BackendKind::Local,
            message: Some(message.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall == OverallStatus::Healthy
    }

    pub fn is_available(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Local => self.local_available,
            BackendKind::Cloud => self.cloud_available,
        }
    }

    pub fn any_available(&self) -> bool {
        self.local_available || self.cloud_available
    }
}

impl Default for HealthStatus {
    /// Before the first probe nothing is known to be available.
    fn default() -> Self {
        Self::unreachable("Health not probed yet")
    }
}
