//! Daemon configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Preset storage settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Audio source settings
    #[serde(default)]
    pub audio: AudioConfig,
    /// Startup session settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// Daemon-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { log_level: default_log_level(), log_json: false }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Preset storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Database path (optional, uses default if not set)
    pub path: Option<PathBuf>,
}

/// Audio source settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioConfig {
    /// Directory the channel sources are resolved against
    #[serde(default = "default_audio_dir")]
    pub dir: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { dir: default_audio_dir() }
    }
}

fn default_audio_dir() -> String {
    "audio".to_string()
}

/// What the session does right after startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Initial master volume
    #[serde(default = "default_master_volume")]
    pub master_volume: u8,
    /// Preset to apply on startup
    #[serde(default)]
    pub startup_preset: Option<String>,
    /// Whether `startup_preset` names a custom preset
    #[serde(default)]
    pub startup_preset_custom: bool,
    /// Sleep timer to start on startup
    #[serde(default)]
    pub sleep_timer_minutes: Option<i64>,
    /// Exit once the sleep timer has paused playback
    #[serde(default)]
    pub exit_when_timer_elapses: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            master_volume: default_master_volume(),
            startup_preset: None,
            startup_preset_custom: false,
            sleep_timer_minutes: None,
            exit_when_timer_elapses: false,
        }
    }
}

fn default_master_volume() -> u8 {
    100
}

/// Load configuration from file or defaults.
pub fn load_config() -> Result<Config> {
    let config_path = config_path()?;

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;
        parse_config(&content).with_context(|| format!("Failed to parse config file: {config_path:?}"))
    } else {
        info!(?config_path, "Config file not found, using defaults");
        Ok(Config::default())
    }
}

/// Parse a TOML configuration document.
pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

/// Get the configuration file path.
fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "ambimix", "Ambimix").context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}
