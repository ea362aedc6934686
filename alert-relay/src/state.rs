//! Shared relay state
//!
//! Event broadcaster and the event channel's connection registry, shared by
//! the HTTP handlers, the channel sockets and the alarm player.

use alert_common::events::ServerEvent;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Registry entry for a connected channel client
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub connected_at: DateTime<Utc>,
}

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes
pub struct SharedState {
    /// Connected event channel clients
    connections: RwLock<HashMap<Uuid, ClientInfo>>,

    /// Event broadcaster for channel clients
    event_tx: broadcast::Sender<ServerEvent>,
}

impl SharedState {
    /// Create new shared state with no connections
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        Self {
            connections: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Broadcast an event to all channel clients
    pub fn broadcast_event(&self, event: ServerEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the server event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<ServerEvent> {
        self.event_tx.subscribe()
    }

    /// Record a client arrival. Returns false if the id was already registered.
    pub async fn register_client(&self, client_id: Uuid) -> bool {
        let info = ClientInfo {
            connected_at: Utc::now(),
        };
        self.connections.write().await.insert(client_id, info).is_none()
    }

    /// Release a client's registry entry. Returns the entry if it existed.
    pub async fn unregister_client(&self, client_id: &Uuid) -> Option<ClientInfo> {
        self.connections.write().await.remove(client_id)
    }

    pub async fn is_connected(&self, client_id: &Uuid) -> bool {
        self.connections.read().await.contains_key(client_id)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_unregister() {
        let state = SharedState::new();
        let id = Uuid::new_v4();

        assert!(state.register_client(id).await);
        assert!(state.is_connected(&id).await);
        assert_eq!(state.connection_count().await, 1);

        assert!(state.unregister_client(&id).await.is_some());
        assert!(!state.is_connected(&id).await);
        assert!(state.unregister_client(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers() {
        let state = SharedState::new();
        // Must not panic with zero receivers
        state.broadcast_event(ServerEvent::AlarmStarted {
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let state = SharedState::new();
        let mut rx = state.subscribe_events();

        state.broadcast_event(ServerEvent::AlarmStopped {
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "AlarmStopped");
    }
}
