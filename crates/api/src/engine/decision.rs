//! The broker-facing decision state machines.
//!
//! The broker blocks on every answer, so each operation always returns
//! a [`Decision`]; only store failures escape as errors (the HTTP layer
//! turns those into a 500, which the broker treats as a deny). Event
//! emission and login-stat updates happen out of band and never extend
//! the decision latency.

use std::sync::Arc;
use std::time::Duration;

use mqguard_cache::HybridCache;
use mqguard_core::events::{
    EVENT_AUTH_FAILED, EVENT_AUTH_SUCCESS, EVENT_CLIENT_CONNECT, EVENT_CLIENT_DISCONNECT,
    EVENT_PUBLISH, EVENT_SUBSCRIBE,
};
use mqguard_core::{acl, fingerprint};
use mqguard_events::{BrokerEvent, EventBus};

use crate::auth::password::verify_password;
use crate::engine::store::{CachedAuthResult, CredentialStore};

/// Why a broker request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingCredentials,
    InvalidCredentials,
    ClientIdMismatch,
    NotAuthorized,
    TopicNotAllowed,
}

impl DenyReason {
    /// The wire code sent back to the broker.
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::MissingCredentials => "missing_credentials",
            DenyReason::InvalidCredentials => "invalid_credentials",
            DenyReason::ClientIdMismatch => "client_id_mismatch",
            DenyReason::NotAuthorized => "not_authorized",
            DenyReason::TopicNotAllowed => "topic_not_allowed",
        }
    }
}

/// Outcome of a broker decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Implements the connect/publish/subscribe decisions.
pub struct AuthDecisionEngine {
    store: Arc<dyn CredentialStore>,
    cache: Arc<HybridCache>,
    bus: Arc<EventBus>,
    cache_ttl: Duration,
    admin_prefix: String,
}

impl AuthDecisionEngine {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        cache: Arc<HybridCache>,
        bus: Arc<EventBus>,
        cache_ttl: Duration,
        admin_prefix: String,
    ) -> Self {
        Self {
            store,
            cache,
            bus,
            cache_ttl,
            admin_prefix,
        }
    }

    // -----------------------------------------------------------------------
    // Register (CONNECT)
    // -----------------------------------------------------------------------

    /// Decide a client connection attempt.
    ///
    /// State machine, short-circuiting on the first failure:
    /// 1. Both credential fields must be non-empty.
    /// 2. Cache hit on `(username, password fingerprint)` skips the
    ///    store lookup and the slow verification.
    /// 3. Unknown or inactive users are `invalid_credentials`.
    /// 4. Argon2 verification; mismatch is `invalid_credentials`.
    /// 5. A bound client id must equal the presented one.
    /// 6. Success updates login stats asynchronously, refreshes the
    ///    cache entry, and emits `auth.success` + `client.connect`.
    ///
    /// Every denial additionally emits `auth.failed` with the reason.
    pub async fn on_register(
        &self,
        client_id: &str,
        username: &str,
        password: &str,
        peer_addr: &str,
    ) -> Result<Decision, sqlx::Error> {
        if username.is_empty() || password.is_empty() {
            return Ok(self.deny_register(
                client_id,
                username,
                peer_addr,
                DenyReason::MissingCredentials,
            ));
        }

        let cache_key = fingerprint::auth_cache_key(username, password);

        let cached = match self.cache.get::<CachedAuthResult>(&cache_key).await {
            Some(cached) => cached,
            None => {
                let user = match self.store.find_by_username(username).await? {
                    Some(user) if user.is_active => user,
                    _ => {
                        return Ok(self.deny_register(
                            client_id,
                            username,
                            peer_addr,
                            DenyReason::InvalidCredentials,
                        ));
                    }
                };

                match verify_password(password, &user.password_hash) {
                    Ok(true) => {}
                    Ok(false) => {
                        return Ok(self.deny_register(
                            client_id,
                            username,
                            peer_addr,
                            DenyReason::InvalidCredentials,
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(username, error = %e, "Password verification error");
                        return Ok(self.deny_register(
                            client_id,
                            username,
                            peer_addr,
                            DenyReason::InvalidCredentials,
                        ));
                    }
                }

                CachedAuthResult::from(&user)
            }
        };

        if let Some(bound) = &cached.client_id {
            if !bound.is_empty() && bound != client_id {
                return Ok(self.deny_register(
                    client_id,
                    username,
                    peer_addr,
                    DenyReason::ClientIdMismatch,
                ));
            }
        }

        // Login stats go through the external write path, fire-and-forget.
        let store = Arc::clone(&self.store);
        let stats_username = username.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.record_login(&stats_username).await {
                tracing::warn!(username = %stats_username, error = %e, "Failed to record login stats");
            }
        });

        self.cache.set(&cache_key, &cached, self.cache_ttl).await;

        self.bus.publish(
            BrokerEvent::new(EVENT_AUTH_SUCCESS)
                .with_client(client_id, username)
                .with_peer(peer_addr),
        );
        self.bus.publish(
            BrokerEvent::new(EVENT_CLIENT_CONNECT)
                .with_client(client_id, username)
                .with_peer(peer_addr),
        );

        Ok(Decision::Allow)
    }

    // -----------------------------------------------------------------------
    // Publish
    // -----------------------------------------------------------------------

    /// Decide a publish attempt.
    ///
    /// Always a direct store lookup; the register cache is not
    /// consulted here. Publish-path denials emit no `auth.failed`
    /// event; that tag is reserved for authentication failures.
    pub async fn on_publish(
        &self,
        client_id: &str,
        username: &str,
        topic: &str,
        payload: &str,
        peer_addr: &str,
    ) -> Result<Decision, sqlx::Error> {
        let user = match self.store.find_by_username(username).await? {
            Some(user) if user.is_active => user,
            _ => return Ok(Decision::Deny(DenyReason::NotAuthorized)),
        };

        if let Some(reason) =
            self.check_topic(topic, user.is_superuser, &user.publish_acl)
        {
            return Ok(Decision::Deny(reason));
        }

        self.bus.publish(
            BrokerEvent::new(EVENT_PUBLISH)
                .with_client(client_id, username)
                .with_peer(peer_addr)
                .with_topic(topic)
                .with_payload(payload),
        );

        Ok(Decision::Allow)
    }

    // -----------------------------------------------------------------------
    // Subscribe
    // -----------------------------------------------------------------------

    /// Decide a subscribe attempt over every requested topic filter.
    ///
    /// Any single filter failing the admin-prefix or pattern check fails
    /// the whole request with that code.
    pub async fn on_subscribe(
        &self,
        client_id: &str,
        username: &str,
        topics: &[String],
        peer_addr: &str,
    ) -> Result<Decision, sqlx::Error> {
        let user = match self.store.find_by_username(username).await? {
            Some(user) if user.is_active => user,
            _ => return Ok(Decision::Deny(DenyReason::NotAuthorized)),
        };

        for topic in topics {
            if let Some(reason) =
                self.check_topic(topic, user.is_superuser, &user.subscribe_acl)
            {
                return Ok(Decision::Deny(reason));
            }
        }

        self.bus.publish(
            BrokerEvent::new(EVENT_SUBSCRIBE)
                .with_client(client_id, username)
                .with_peer(peer_addr)
                .with_topic(topics.join(",")),
        );

        Ok(Decision::Allow)
    }

    // -----------------------------------------------------------------------
    // Disconnect
    // -----------------------------------------------------------------------

    /// Note a client disconnect.
    ///
    /// Pure notification: there is nothing to decide and no store to
    /// consult, only the `client.disconnect` event to emit.
    pub fn on_disconnect(&self, client_id: &str, username: &str, peer_addr: &str) {
        self.bus.publish(
            BrokerEvent::new(EVENT_CLIENT_DISCONNECT)
                .with_client(client_id, username)
                .with_peer(peer_addr),
        );
    }

    // -----------------------------------------------------------------------
    // Shared checks
    // -----------------------------------------------------------------------

    /// Admin-prefix and ACL pattern check shared by publish/subscribe.
    ///
    /// An empty pattern list leaves the user unrestricted (beyond the
    /// admin prefix).
    fn check_topic(&self, topic: &str, is_superuser: bool, raw_acl: &str) -> Option<DenyReason> {
        if topic.starts_with(&self.admin_prefix) && !is_superuser {
            return Some(DenyReason::NotAuthorized);
        }

        let patterns = acl::split_patterns(raw_acl);
        if !patterns.is_empty() && !acl::is_allowed(topic, &patterns) {
            return Some(DenyReason::TopicNotAllowed);
        }

        None
    }

    /// Emit `auth.failed` with the reason and wrap it in a denial.
    fn deny_register(
        &self,
        client_id: &str,
        username: &str,
        peer_addr: &str,
        reason: DenyReason,
    ) -> Decision {
        self.bus.publish(
            BrokerEvent::new(EVENT_AUTH_FAILED)
                .with_client(client_id, username)
                .with_peer(peer_addr)
                .with_reason(reason.as_str()),
        );
        Decision::Deny(reason)
    }
}
