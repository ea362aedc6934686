//! # Alert Relay Common Library
//!
//! Shared code for the alert relay service:
//! - Error type
//! - Bootstrap configuration (TOML file, defaults, config file discovery)
//! - Event channel wire types (inbound client frames, outbound server events)

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
