//! Broker event-type tags.
//!
//! These are the event types a webhook trigger can bind to. The strings
//! are stored in `webhook_triggers.event_type` and must stay stable.

/// A client authenticated successfully.
pub const EVENT_AUTH_SUCCESS: &str = "auth.success";

/// A client failed authentication; the event payload carries the reason.
pub const EVENT_AUTH_FAILED: &str = "auth.failed";

/// A client connected (emitted alongside `auth.success`).
pub const EVENT_CLIENT_CONNECT: &str = "client.connect";

/// A client disconnected.
pub const EVENT_CLIENT_DISCONNECT: &str = "client.disconnect";

/// An authorized publish.
pub const EVENT_PUBLISH: &str = "publish";

/// An authorized subscribe.
pub const EVENT_SUBSCRIBE: &str = "subscribe";

/// All known event types, for admin-surface validation.
pub const ALL_EVENT_TYPES: &[&str] = &[
    EVENT_AUTH_SUCCESS,
    EVENT_AUTH_FAILED,
    EVENT_CLIENT_CONNECT,
    EVENT_CLIENT_DISCONNECT,
    EVENT_PUBLISH,
    EVENT_SUBSCRIBE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_event_types_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for t in ALL_EVENT_TYPES {
            assert!(seen.insert(*t), "duplicate event type: {t}");
        }
    }
}
