use clap::ValueEnum;
use serde::Deserialize;
use std::path::PathBuf;

use crate::constants::{ONLINE_THRESHOLD_MS, PURGE_INTERVAL_SECS};

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    /// Signage server configuration
    Serve,
}

fn default_port() -> u16 {
    5000
}

fn default_db_name() -> String {
    "signage".to_string()
}

fn default_purge_interval_secs() -> u64 {
    PURGE_INTERVAL_SECS
}

fn default_online_threshold_ms() -> i64 {
    ONLINE_THRESHOLD_MS
}

/// Server configuration file structure
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Configuration type (must be "serve")
    pub config_type: ConfigType,
    /// Directory holding the database, media files and lock file (required)
    pub data_dir: PathBuf,
    /// Port to listen on (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database file name without extension (default: signage)
    #[serde(default = "default_db_name")]
    pub db_name: String,
    /// Seconds between expiry purge passes (default: 60)
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
    /// Milliseconds of heartbeat silence before a player counts as offline (default: 30000)
    #[serde(default = "default_online_threshold_ms")]
    pub online_threshold_ms: i64,
    /// Credential profile name to look up the operator token from
    /// ~/.config/signage_server/credentials.toml (required)
    pub operator_credential_profile: String,
    /// Allowed CORS origins for the admin UI (default: allow any)
    pub allowed_origins: Option<Vec<String>>,
}

impl ServerConfig {
    /// Basic sanity checks before the server starts
    pub fn validate(&self) -> Result<(), String> {
        if self.purge_interval_secs == 0 {
            return Err("purge_interval_secs must be at least 1".to_string());
        }
        if self.online_threshold_ms <= 0 {
            return Err("online_threshold_ms must be positive".to_string());
        }
        if self.operator_credential_profile.trim().is_empty() {
            return Err("operator_credential_profile must not be empty".to_string());
        }
        Ok(())
    }

    /// Media uploads live under the data directory
    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }
}

/// Load and validate a server configuration from a TOML file
pub fn load_config(path: &PathBuf) -> Result<ServerConfig, Box<dyn std::error::Error + Send + Sync>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
    let config: ServerConfig = toml::from_str(&content)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
    config.validate()?;
    Ok(config)
}
