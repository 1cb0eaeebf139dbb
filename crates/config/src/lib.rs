//! Configuration loading, validation, and management for docpilot.
//!
//! Loads configuration from `~/.docpilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The context policy (token budget, citation requirement) is fixed per call
//! and has no config entry.

use docpilot_core::model::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.docpilot/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the document/chat backend
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,

    /// Upload pre-validation
    #[serde(default)]
    pub uploads: UploadConfig,
}

fn default_api_url() -> String {
    "http://localhost:8000".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Include the project directory pool by default
    #[serde(default = "default_true")]
    pub include_project: bool,

    /// Include the reference (standards) pool by default
    #[serde(default = "default_true")]
    pub include_reference: bool,

    /// Refuse to submit a question when no source would ground it
    #[serde(default = "default_true")]
    pub require_context: bool,

    /// Overrides the backend the health probe reports as default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_backend: Option<BackendKind>,

    /// Context mode sent with every payload
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "chat".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            include_project: true,
            include_reference: true,
            require_context: true,
            preferred_backend: None,
            mode: default_mode(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted file, in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Accepted extensions, lowercase with leading dot
    #[serde(default = "default_supported_extensions")]
    pub supported_extensions: Vec<String>,
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}
fn default_supported_extensions() -> Vec<String> {
    [".pdf", ".doc", ".docx", ".xls", ".xlsx", ".pptx", ".txt", ".md"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            supported_extensions: default_supported_extensions(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docpilot/config.toml).
    ///
    /// Environment variables override the file:
    /// - `DOCPILOT_API_URL`
    /// - `DOCPILOT_BACKEND` (`local` or `cloud`)
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DOCPILOT_API_URL") {
            self.api_url = url;
        }

        if let Some(backend) = lookup("DOCPILOT_BACKEND") {
            let kind = backend
                .parse::<BackendKind>()
                .map_err(ConfigError::ValidationError)?;
            self.session.preferred_backend = Some(kind);
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docpilot")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.uploads.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "uploads.max_file_size must be greater than 0".into(),
            ));
        }

        if let Some(ext) = self
            .uploads
            .supported_extensions
            .iter()
            .find(|e| !e.starts_with('.'))
        {
            return Err(ConfigError::ValidationError(format!(
                "uploads.supported_extensions entries must start with '.', got '{ext}'"
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            session: SessionConfig::default(),
            uploads: UploadConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
