//! Test helper modules for alert-relay integration tests
//!
//! - TestServer: in-process router plus an optional live listener
//! - RecordingSink: audio sink that records calls instead of playing
//! - multipart / WAV builders for request bodies and alarm assets

#![allow(dead_code)]

pub mod recording_sink;
pub mod test_server;

pub use recording_sink::RecordingSink;
pub use test_server::{multipart_body, write_alarm_wav, LiveServer, TestServer, BOUNDARY};
