//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.parlor/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::scroll;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ParlorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub default_channel: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub scroll_threshold: Option<u16>,
    pub notice_seconds: Option<u64>,
    pub time_format: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_NOTICE_SECONDS: u64 = 4;
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub user_id: Option<String>,
    pub channel_id: Option<String>,
    pub scroll_threshold: u16,
    pub notice_seconds: u64,
    pub time_format: String,
}

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub base_url: Option<&'a str>,
    pub channel: Option<&'a str>,
    pub user: Option<&'a str>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.parlor/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".parlor").join("config.toml"))
}

/// Load config from `~/.parlor/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ParlorConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ParlorConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine home directory, using default config");
        return Ok(ParlorConfig::default());
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ParlorConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ParlorConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ParlorConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Parlor Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# default_channel = "3f2c..."        # Or PARLOR_CHANNEL / --channel

# [server]
# base_url = "http://localhost:8000/api"   # Or PARLOR_BASE_URL / --base-url
# user_id = "alice"                  # Or PARLOR_USER_ID / --user

# [ui]
# scroll_threshold = 1               # Rows from the bottom still counted as "following"
# notice_seconds = 4                 # How long notifications stay visible
# time_format = "%H:%M"              # chrono format for message time labels
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ParlorConfig, cli: &CliOverrides<'_>) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an injectable environment lookup.
pub fn resolve_with_env(
    config: &ParlorConfig,
    cli: &CliOverrides<'_>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .map(str::to_string)
        .or_else(|| env("PARLOR_BASE_URL"))
        .or_else(|| config.server.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let user_id = cli
        .user
        .map(str::to_string)
        .or_else(|| env("PARLOR_USER_ID"))
        .or_else(|| config.server.user_id.clone());

    let channel_id = cli
        .channel
        .map(str::to_string)
        .or_else(|| env("PARLOR_CHANNEL"))
        .or_else(|| config.general.default_channel.clone())
        .filter(|c| !c.trim().is_empty());

    ResolvedConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        user_id,
        channel_id,
        scroll_threshold: config
            .ui
            .scroll_threshold
            .unwrap_or(scroll::DEFAULT_THRESHOLD),
        notice_seconds: config.ui.notice_seconds.unwrap_or(DEFAULT_NOTICE_SECONDS),
        time_format: config
            .ui
            .time_format
            .clone()
            .unwrap_or_else(|| DEFAULT_TIME_FORMAT.to_string()),
    }
}
