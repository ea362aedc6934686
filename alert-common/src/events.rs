//! Event channel wire types
//!
//! Clients push [`ClientFrame`]s over the event channel; the server pushes
//! [`ServerEvent`]s back, serialized as JSON text with a `type` tag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event name clients use to raise an intrusion alert
pub const ALERT_EVENT: &str = "alert";

/// Inbound frame from an event channel client
///
/// `data` is carried through untouched; the relay never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientFrame {
    /// Event name (e.g. "alert")
    pub event: String,
    /// Detection details, opaque to the relay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ClientFrame {
    /// Build an alert frame
    pub fn alert(data: Option<serde_json::Value>) -> Self {
        Self {
            event: ALERT_EVENT.to_string(),
            data,
        }
    }

    /// Raw JSON text of `data`, empty when the client sent none
    pub fn payload_text(&self) -> String {
        self.data
            .as_ref()
            .map(|value| value.to_string())
            .unwrap_or_default()
    }
}

/// Server-originated event pushed to channel clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Sent once to a client right after it connects
    Welcome {
        /// Identity assigned to the connection
        client_id: Uuid,
    },

    /// A client raised an alert
    AlertRaised {
        /// Client that sent the alert
        client_id: Uuid,
        /// When the alert was received
        timestamp: DateTime<Utc>,
    },

    /// Alarm went from idle to playing
    AlarmStarted {
        /// When playback started
        timestamp: DateTime<Utc>,
    },

    /// Alarm went from playing to idle
    AlarmStopped {
        /// When playback was halted
        timestamp: DateTime<Utc>,
    },

    /// An uploaded image was written to disk
    ImageStored {
        /// Stored file path
        path: String,
        /// When the file was written
        timestamp: DateTime<Utc>,
    },
}

impl ServerEvent {
    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            ServerEvent::Welcome { .. } => "Welcome",
            ServerEvent::AlertRaised { .. } => "AlertRaised",
            ServerEvent::AlarmStarted { .. } => "AlarmStarted",
            ServerEvent::AlarmStopped { .. } => "AlarmStopped",
            ServerEvent::ImageStored { .. } => "ImageStored",
        }
    }
}
