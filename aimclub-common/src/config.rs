//! Configuration loading and config file resolution
//!
//! Resolution order for the config file:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`AIMCLUB_CONFIG`)
//! 3. Platform config file (`~/.config/aimclub/config.toml`, then `/etc/aimclub/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: the service starts on defaults and logs a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "AIMCLUB_CONFIG";

/// Service configuration
///
/// Every field has a default, so a partial TOML file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Public site URL; tracking links are `<site_base_url>?track=<token>`
    pub site_base_url: String,
    /// Address receiving admin copies and one-time access codes
    pub admin_email: String,
    /// Master key for admin login (None disables master-key login)
    pub master_key: Option<String>,
    /// Broadcast buffer for realtime change events
    pub event_bus_capacity: usize,
    pub notifier: NotifierConfig,
    pub otp: OtpConfig,
}

/// Outbound email relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// When false, messages are logged instead of delivered
    pub enabled: bool,
    /// Relay endpoint; the admin address is appended to form the request URL
    pub endpoint: String,
    /// Upper bound on a single delivery attempt
    pub timeout_secs: u64,
}

/// Delegated one-time access code settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    pub ttl_secs: u64,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5780".to_string(),
            database_path: default_database_path(),
            site_base_url: "http://localhost:5780/".to_string(),
            admin_email: "admin@aimclub.example".to_string(),
            master_key: None,
            event_bus_capacity: 256,
            notifier: NotifierConfig::default(),
            otp: OtpConfig::default(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://formsubmit.co/ajax/".to_string(),
            timeout_secs: 20,
        }
    }
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

impl ClubConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load a config file from an explicit path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load the service configuration
    ///
    /// An explicitly named file (CLI or environment) must load; a platform file
    /// that fails to parse is reported and defaults are used instead.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        if let Some(path) = resolve_config_path(cli_arg) {
            info!("Loading configuration from {}", path.display());
            return Self::from_file(&path);
        }

        match platform_config_file() {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path.display());
                    Ok(config)
                }
                Err(e) => {
                    warn!("Ignoring unreadable config {}: {}", path.display(), e);
                    Ok(Self::default())
                }
            },
            None => {
                warn!("No config file found, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Build the public tracking link for a token
    pub fn tracking_link(&self, tracking_id: &str) -> String {
        tracking_link(&self.site_base_url, tracking_id)
    }
}

/// `<base>?track=<token>`, token carried verbatim
pub fn tracking_link(base_url: &str, tracking_id: &str) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}track={}", base_url, separator, tracking_id)
}

/// Explicit config file from CLI argument or environment variable
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    None
}

/// First existing platform config file
fn platform_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("aimclub").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/aimclub/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("aimclub"))
        .unwrap_or_else(|| PathBuf::from("./aimclub_data"))
        .join("aimclub.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClubConfig::from_toml_str(
            r#"
            admin_email = "chair@club.example"

            [notifier]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.admin_email, "chair@club.example");
        assert!(!config.notifier.enabled);
        assert_eq!(config.notifier.timeout_secs, 20);
        assert_eq!(config.bind_addr, "127.0.0.1:5780");
        assert_eq!(config.otp.ttl_secs, 600);
        assert!(config.master_key.is_none());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = ClubConfig::from_toml_str("bind_addr = [");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_tracking_link_appends_query() {
        assert_eq!(
            tracking_link("https://aim.example/", "track_abc123"),
            "https://aim.example/?track=track_abc123"
        );
        assert_eq!(
            tracking_link("https://aim.example/?lang=en", "track_abc123"),
            "https://aim.example/?lang=en&track=track_abc123"
        );
    }

    #[test]
    fn test_cli_arg_wins() {
        let path = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(resolve_config_path(Some(&path)), Some(path));
    }
}
