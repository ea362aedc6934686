//! alert-relay configuration
//!
//! Command-line arguments (each with an `ALERT_RELAY_*` environment
//! variable) layered over the TOML bootstrap file and built-in defaults.

use crate::error::{Error, Result};
use alert_common::config::TomlConfig;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Command-line arguments for alert-relay
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "alert-relay")]
#[command(about = "Intrusion alert relay: image uploads, alert channel and local alarm")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "ALERT_RELAY_PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(short, long, env = "ALERT_RELAY_BIND")]
    pub bind: Option<String>,

    /// Directory uploaded images are saved to
    #[arg(long, env = "ALERT_RELAY_IMAGE_DIR")]
    pub image_dir: Option<PathBuf>,

    /// Audio file looped while the alarm is active
    #[arg(long, env = "ALERT_RELAY_ALARM_SOUND")]
    pub alarm_sound: Option<PathBuf>,

    /// Output device name (default device if omitted)
    #[arg(long, env = "ALERT_RELAY_AUDIO_DEVICE")]
    pub audio_device: Option<String>,

    /// Alarm volume (0.0-1.0)
    #[arg(long, env = "ALERT_RELAY_VOLUME")]
    pub volume: Option<f32>,

    /// Path to TOML config file
    #[arg(short, long, env = alert_common::config::CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    /// List audio output devices and exit
    #[arg(long)]
    pub list_devices: bool,
}

/// Resolved relay configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub image_dir: PathBuf,
    pub alarm_sound: PathBuf,
    pub audio_device: Option<String>,
    pub volume: f32,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl Config {
    /// Load the TOML layer named by `args` and apply argument overrides
    pub fn load(args: &Args) -> Result<Self> {
        let toml = TomlConfig::load_or_default(args.config.as_deref())?;
        Self::merge(args, toml)
    }

    /// Apply argument overrides on top of a TOML configuration
    pub fn merge(args: &Args, toml: TomlConfig) -> Result<Self> {
        let bind = args.bind.as_deref().unwrap_or(&toml.bind_addr);
        let bind_addr: IpAddr = bind
            .parse()
            .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", bind, e)))?;

        let volume = args.volume.unwrap_or(toml.volume);
        if !(0.0..=1.0).contains(&volume) {
            return Err(Error::Config(format!(
                "Volume must be between 0.0 and 1.0, got {}",
                volume
            )));
        }

        Ok(Self {
            bind_addr,
            port: args.port.unwrap_or(toml.port),
            image_dir: args.image_dir.clone().unwrap_or(toml.image_dir),
            alarm_sound: args.alarm_sound.clone().unwrap_or(toml.alarm_sound),
            audio_device: args.audio_device.clone().or(toml.audio_device),
            volume,
            max_upload_bytes: toml.max_upload_bytes,
            log_level: toml.logging.level,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
