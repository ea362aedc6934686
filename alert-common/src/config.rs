//! Bootstrap configuration loading and config file discovery
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (resolved by the service binary)
//! 2. Environment variables (resolved by the service binary)
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! Every TOML key is optional. A missing config file is not an error: the
//! service starts on built-in defaults and logs a warning.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ALERT_RELAY_CONFIG";

/// Directory name used under the platform config dir
const APP_DIR_NAME: &str = "alert-relay";

/// Built-in default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Built-in default bind address
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

/// Built-in default directory for uploaded images
pub const DEFAULT_IMAGE_DIR: &str = "intruders";

/// Built-in default alarm sound asset
pub const DEFAULT_ALARM_SOUND: &str = "alarm.mp3";

/// Built-in default upload size limit (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Directory uploaded images are written to (created on startup)
    pub image_dir: PathBuf,

    /// Audio asset looped while the alarm plays
    pub alarm_sound: PathBuf,

    /// Output device name (None = system default device)
    pub audio_device: Option<String>,

    /// Alarm volume (0.0-1.0)
    pub volume: f32,

    /// Maximum accepted request body size for uploads
    pub max_upload_bytes: usize,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            alarm_sound: PathBuf::from(DEFAULT_ALARM_SOUND),
            audio_device: None,
            volume: 1.0,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// A missing file yields built-in defaults. An unreadable or malformed
    /// file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content).map_err(|e| {
            Error::Config(format!("Failed to load {}: {}", path.display(), e))
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the resolved config file, or defaults if there is none
    pub fn load_or_default(cli_path: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_path) {
            Some(path) => Self::load(&path),
            None => {
                info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Config(format!(
                "volume must be within 0.0-1.0, got {}",
                self.volume
            )));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::Config(
                "max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve which config file to read
///
/// 1. Explicit path (command-line argument)
/// 2. `ALERT_RELAY_CONFIG` environment variable
/// 3. `<platform config dir>/alert-relay/config.toml`, only if it exists
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|path| path.exists())
}

/// Platform config file location (e.g. `~/.config/alert-relay/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}
