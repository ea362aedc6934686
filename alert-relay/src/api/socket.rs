//! WebSocket transport for the event channel
//!
//! Socket open/close are the channel's connect/disconnect events. Inbound
//! text frames are parsed as [`ClientFrame`]s; outbound frames are the
//! serialized [`ServerEvent`] broadcast stream.

use crate::api::server::AppContext;
use crate::channel::{ChannelEvent, EventChannel};
use alert_common::events::{ClientFrame, ServerEvent};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// GET /events - Upgrade to the event channel
pub async fn event_socket(ws: WebSocketUpgrade, State(ctx): State<AppContext>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx.channel))
}

async fn handle_socket(socket: WebSocket, channel: EventChannel) {
    let client_id = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Subscribe before registering so nothing broadcast after connect is missed
    let mut events = channel.state().subscribe_events();
    channel.dispatch(ChannelEvent::Connect { client_id }).await;

    if send_event(&mut ws_tx, &ServerEvent::Welcome { client_id }).await {
        loop {
            tokio::select! {
                // Server -> client
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if !send_event(&mut ws_tx, &event).await {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Client {} lagged, skipped {} events", client_id, skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }

                // Client -> server
                result = ws_rx.next() => {
                    match result {
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("Socket closed by client {}", client_id);
                            break;
                        }
                        Some(Ok(msg)) => handle_message(&channel, client_id, msg).await,
                        Some(Err(e)) => {
                            error!("WebSocket error from {}: {}", client_id, e);
                            break;
                        }
                    }
                }
            }
        }
    }

    channel.dispatch(ChannelEvent::Disconnect { client_id }).await;
}

async fn handle_message(channel: &EventChannel, client_id: Uuid, msg: Message) {
    match msg {
        Message::Text(text) => {
            let frame: ClientFrame = match serde_json::from_str(&text) {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("Ignoring malformed frame from {}: {}", client_id, e);
                    return;
                }
            };

            match ChannelEvent::from_frame(client_id, &frame) {
                // Playback runs detached; the handle is intentionally dropped
                Some(event) => {
                    channel.dispatch(event).await;
                }
                None => info!("Ignoring unknown event '{}' from {}", frame.event, client_id),
            }
        }
        Message::Binary(_) => {
            debug!("Received binary message from {} (ignored)", client_id);
        }
        // Axum answers pings itself
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) => {}
    }
}

/// Returns false once the socket can no longer be written
async fn send_event<S>(ws_tx: &mut S, event: &ServerEvent) -> bool
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize {}: {}", event.event_type(), e);
            return true;
        }
    };

    match ws_tx.send(Message::Text(json)).await {
        Ok(()) => true,
        Err(e) => {
            debug!("Failed to send {}: {}", event.event_type(), e);
            false
        }
    }
}
