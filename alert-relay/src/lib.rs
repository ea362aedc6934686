//! alert-relay library
//!
//! Intrusion alert relay: accepts image uploads over HTTP, takes alert
//! events over a WebSocket channel and loops a local alarm sound until told
//! to stop.

pub mod alarm;
pub mod api;
pub mod audio;
pub mod channel;
pub mod config;
pub mod error;
pub mod images;
pub mod logging;
pub mod state;

pub use alarm::{AlarmPlayer, AlarmState};
pub use error::{Error, Result};
pub use state::SharedState;
