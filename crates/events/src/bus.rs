//! Event bus backed by a `tokio::sync::broadcast` channel.
//!
//! The decision engine publishes [`BrokerEvent`]s here without awaiting
//! anyone; the webhook trigger engine consumes them on its own task.
//! Publishing never blocks the broker-facing path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// A broker event assembled at decision time.
///
/// Transient value object: it is never persisted directly, only
/// rendered into webhook payloads. Constructed via [`BrokerEvent::new`]
/// and the builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerEvent {
    /// One of the tags in `mqguard_core::events`.
    pub event_type: String,

    /// MQTT client identifier, when known.
    pub client_id: Option<String>,

    /// Username presented by the client.
    pub username: Option<String>,

    /// Peer socket address as reported by the broker.
    pub peer_addr: Option<String>,

    /// Topic involved in publish/subscribe events.
    pub topic: Option<String>,

    /// Message payload for publish events (broker-provided encoding).
    pub payload: Option<String>,

    /// Denial reason for `auth.failed` events.
    pub reason: Option<String>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl BrokerEvent {
    /// Create an event with only the required type tag.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            client_id: None,
            username: None,
            peer_addr: None,
            topic: None,
            payload: None,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach the client identity fields.
    pub fn with_client(
        mut self,
        client_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.username = Some(username.into());
        self
    }

    /// Attach the peer address.
    pub fn with_peer(mut self, peer_addr: impl Into<String>) -> Self {
        self.peer_addr = Some(peer_addr.into());
        self
    }

    /// Attach the topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Attach the message payload.
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Attach the denial reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// In-process fan-out bus for [`BrokerEvent`]s.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers
/// independently receive every published event. Shared via
/// `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<BrokerEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are
    /// dropped; slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is silently dropped.
    pub fn publish(&self, event: BrokerEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<BrokerEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use mqguard_core::events::EVENT_AUTH_FAILED;

    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            BrokerEvent::new(EVENT_AUTH_FAILED)
                .with_client("client-1", "alice")
                .with_peer("10.0.0.7:51234")
                .with_reason("invalid_credentials"),
        );

        let event = rx.recv().await.expect("should receive the event");
        assert_eq!(event.event_type, EVENT_AUTH_FAILED);
        assert_eq!(event.client_id.as_deref(), Some("client-1"));
        assert_eq!(event.username.as_deref(), Some("alice"));
        assert_eq!(event.reason.as_deref(), Some("invalid_credentials"));
        assert!(event.topic.is_none());
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(BrokerEvent::new("publish").with_topic("a/b"));

        assert_eq!(rx1.recv().await.unwrap().topic.as_deref(), Some("a/b"));
        assert_eq!(rx2.recv().await.unwrap().topic.as_deref(), Some("a/b"));
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(BrokerEvent::new("client.disconnect"));
    }
}
