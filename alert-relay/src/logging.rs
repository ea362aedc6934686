//! Tracing setup
//!
//! The subscriber is installed before configuration is read so config
//! loading can log. `RUST_LOG` wins when set; otherwise the filter starts
//! at `info` and is swapped for the configured level once it is known.

use crate::error::{Error, Result};
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Level used until configuration is loaded
pub const DEFAULT_LEVEL: &str = "info";

/// Filter directives for the relay's own crates at `level`
pub fn directives(level: &str) -> String {
    format!(
        "alert_relay={level},alert_common={level},tower_http={level}",
        level = level
    )
}

/// Handle for adjusting the level after startup
pub struct LogHandle {
    /// None when `RUST_LOG` controls filtering
    reload: Option<reload::Handle<EnvFilter, Registry>>,
}

impl LogHandle {
    /// Apply the configured log level.
    ///
    /// Does nothing when `RUST_LOG` was set.
    pub fn apply_level(&self, level: &str) -> Result<()> {
        let Some(handle) = &self.reload else {
            return Ok(());
        };

        let filter = EnvFilter::try_new(directives(level))
            .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", level, e)))?;
        handle
            .reload(filter)
            .map_err(|e| Error::Internal(format!("Failed to apply log level: {}", e)))
    }
}

/// Install the global subscriber
pub fn init() -> LogHandle {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(directives(DEFAULT_LEVEL)), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    LogHandle {
        reload: (!from_env).then_some(handle),
    }
}
