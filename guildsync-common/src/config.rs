//! Configuration loading and resolution
//!
//! Config file location priority:
//! 1. Command-line argument (highest priority)
//! 2. `GUILDSYNC_CONFIG` environment variable
//! 3. `<platform config dir>/guildsync/config.toml`
//! 4. Compiled defaults (no file)
//!
//! Individual values are then overridden from `GUILDSYNC_*` environment
//! variables, so environment always beats TOML.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "GUILDSYNC_CONFIG";

/// Hard cap on caller-supplied roster size estimates
pub const DEFAULT_MAX_ESTIMATED_MEMBERS: u64 = 100_000;

/// Top-level TOML configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Socket address the HTTP surface listens on
    pub bind_addr: String,
    pub logging: LoggingConfig,
    pub discord: DiscordConfig,
    pub sheets: SheetsConfig,
    pub credentials: CredentialsConfig,
    pub sync: SyncConfig,
    pub security: SecurityConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5780".to_string(),
            logging: LoggingConfig::default(),
            discord: DiscordConfig::default(),
            sheets: SheetsConfig::default(),
            credentials: CredentialsConfig::default(),
            sync: SyncConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing level ("trace" .. "error"); `RUST_LOG` overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Community platform (roster API) configuration
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub api_base: String,
    pub bot_token: Option<String>,
    /// Only this user may trigger a sync
    pub admin_user_id: Option<String>,
    /// Sync commands must originate from this channel
    pub admin_channel_id: Option<String>,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            api_base: "https://discord.com/api/v10".to_string(),
            bot_token: None,
            admin_user_id: None,
            admin_channel_id: None,
        }
    }
}

impl fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("admin_user_id", &self.admin_user_id)
            .field("admin_channel_id", &self.admin_channel_id)
            .finish()
    }
}

/// Spreadsheet store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub api_base: String,
    pub token_endpoint: String,
    pub spreadsheet_id: Option<String>,
    /// Range holding the external identifiers (column A)
    pub range: String,
    /// Numeric sheet id used by row deletion
    pub sheet_id: i64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            spreadsheet_id: None,
            range: "Sheet1!A:A".to_string(),
            sheet_id: 0,
        }
    }
}

/// Service-account credentials loaded from configuration
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub client_email: Option<String>,
    pub private_key: Option<String>,
}

impl fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("client_email", &self.client_email)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    pub max_estimated_members: u64,
    /// Delay before the single 429 retry when the body carries no `retry_after`
    pub default_retry_after_ms: u64,
    /// Client-side pacing of roster page requests
    pub requests_per_second: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_estimated_members: DEFAULT_MAX_ESTIMATED_MEMBERS,
            default_retry_after_ms: 1000,
            requests_per_second: 50,
        }
    }
}

/// Inbound request signing
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Unset disables signature checks
    pub shared_secret: Option<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TomlConfig {
    /// Resolve, read and parse the configuration, then apply environment overrides
    ///
    /// A missing file is not fatal: a warning is logged and defaults are used.
    /// A file that exists but cannot be parsed is an error.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                read_toml_config(&path)?
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                info!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Override individual values from `GUILDSYNC_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_value("GUILDSYNC_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = env_value("GUILDSYNC_BOT_TOKEN") {
            self.discord.bot_token = Some(v);
        }
        if let Some(v) = env_value("GUILDSYNC_ADMIN_USER_ID") {
            self.discord.admin_user_id = Some(v);
        }
        if let Some(v) = env_value("GUILDSYNC_ADMIN_CHANNEL_ID") {
            self.discord.admin_channel_id = Some(v);
        }
        if let Some(v) = env_value("GUILDSYNC_SPREADSHEET_ID") {
            self.sheets.spreadsheet_id = Some(v);
        }
        if let Some(v) = env_value("GUILDSYNC_SHARED_SECRET") {
            self.security.shared_secret = Some(v);
        }
    }
}

/// Read an environment variable, treating blank values as unset
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Locate the configuration file
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_value(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("guildsync").join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}
