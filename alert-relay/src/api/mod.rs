//! HTTP API for the alert relay
//!
//! Upload and stop-alarm endpoints, the WebSocket event channel and a
//! health check, all sharing one [`AppContext`].

pub mod handlers;
pub mod server;
pub mod socket;

pub use server::{create_router, run, AppContext};
