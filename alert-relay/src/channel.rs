//! Event channel
//!
//! Handles the three channel event kinds. Per client the channel moves
//! `Disconnected -> Connected -> Disconnected`; presence in the shared
//! connection registry is the `Connected` state.

use crate::alarm::AlarmPlayer;
use crate::state::SharedState;
use alert_common::events::{ClientFrame, ServerEvent, ALERT_EVENT};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

/// Opaque alert payload as sent by the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertPayload(pub String);

impl AlertPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Event delivered to the channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connect { client_id: Uuid },
    Disconnect { client_id: Uuid },
    Alert { client_id: Uuid, payload: AlertPayload },
}

impl ChannelEvent {
    /// Map an inbound frame to an event. Unknown event names yield None.
    pub fn from_frame(client_id: Uuid, frame: &ClientFrame) -> Option<Self> {
        match frame.event.as_str() {
            ALERT_EVENT => Some(ChannelEvent::Alert {
                client_id,
                payload: AlertPayload(frame.payload_text()),
            }),
            _ => None,
        }
    }
}

/// Event channel dispatcher
#[derive(Clone)]
pub struct EventChannel {
    state: Arc<SharedState>,
    alarm: Arc<AlarmPlayer>,
}

impl EventChannel {
    pub fn new(state: Arc<SharedState>, alarm: Arc<AlarmPlayer>) -> Self {
        Self { state, alarm }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Handle one event.
    ///
    /// For alerts, returns the handle of the fire-and-forget playback task.
    /// Callers are not expected to await it.
    pub async fn dispatch(&self, event: ChannelEvent) -> Option<JoinHandle<()>> {
        match event {
            ChannelEvent::Connect { client_id } => {
                if !self.state.register_client(client_id).await {
                    warn!("Client {} connected twice", client_id);
                }
                info!("Client connected: {}", client_id);
                None
            }
            ChannelEvent::Disconnect { client_id } => {
                if self.state.unregister_client(&client_id).await.is_none() {
                    warn!("Disconnect for unknown client {}", client_id);
                }
                info!("Client disconnected: {}", client_id);
                None
            }
            ChannelEvent::Alert { client_id, payload } => {
                info!("Alert received from {}: {}", client_id, payload.as_str());
                self.state.broadcast_event(ServerEvent::AlertRaised {
                    client_id,
                    timestamp: chrono::Utc::now(),
                });
                Some(self.alarm.trigger())
            }
        }
    }
}
