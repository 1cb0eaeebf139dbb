pub mod chat;
pub mod classify;
pub mod config_cmd;
pub mod dirs;
pub mod status;

use docpilot_client::HttpBackend;
use docpilot_config::AppConfig;

/// Load config and build the HTTP backend from it.
pub fn connect() -> Result<(AppConfig, HttpBackend), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let backend = docpilot_client::build_from_config(&config)
        .map_err(|e| format!("Failed to create backend client: {e}"))?;
    Ok((config, backend))
}
