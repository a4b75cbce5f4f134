use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use mqguard_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a feed subscriber.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// One subscribed feed connection.
pub struct WsConnection {
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// Tracks all live execution-feed subscribers.
///
/// Thread-safe via interior `RwLock`; wrapped in `Arc` and shared
/// between the upgrade handler and the trigger engine's notifier.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new subscriber.
    ///
    /// Returns the receiver half of the message channel so the caller
    /// can forward messages to the WebSocket sink.
    pub async fn add(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a subscriber by its connection ID.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Push a message to every subscriber.
    ///
    /// Connections whose send channels are closed are silently skipped;
    /// they get cleaned up by their own receive loop.
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Current number of subscribers.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Send a Close frame to every subscriber, then clear the map.
    ///
    /// Called during graceful shutdown before the listener stops.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all execution feed connections");
    }

    /// Send a Ping frame to every subscriber.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_every_subscriber() {
        let manager = WsManager::new();
        let mut rx_a = manager.add("a".to_string()).await;
        let mut rx_b = manager.add("b".to_string()).await;
        assert_eq!(manager.connection_count().await, 2);

        manager.broadcast(Message::Text("hi".into())).await;

        let msg_a = rx_a.recv().await.expect("a should receive");
        let msg_b = rx_b.recv().await.expect("b should receive");
        assert!(matches!(&msg_a, Message::Text(t) if *t == "hi"));
        assert!(matches!(&msg_b, Message::Text(t) if *t == "hi"));
    }

    #[tokio::test]
    async fn removed_subscriber_stops_receiving() {
        let manager = WsManager::new();
        let mut rx = manager.add("a".to_string()).await;
        manager.remove("a").await;
        assert_eq!(manager.connection_count().await, 0);

        manager.broadcast(Message::Text("hi".into())).await;
        // Sender half was dropped with the connection entry.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn shutdown_sends_close_and_clears() {
        let manager = WsManager::new();
        let mut rx = manager.add("a".to_string()).await;

        manager.shutdown_all().await;

        let msg = rx.recv().await.expect("should receive Close");
        assert!(matches!(msg, Message::Close(None)));
        assert_eq!(manager.connection_count().await, 0);
    }
}
