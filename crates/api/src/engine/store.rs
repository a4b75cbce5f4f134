//! Credential store seam and the cached auth projection.

use async_trait::async_trait;
use mqguard_db::models::user::MqttUser;
use mqguard_db::repositories::UserRepo;
use mqguard_db::DbPool;
use serde::{Deserialize, Serialize};

/// Read-only access to user records, plus the out-of-band login-stats
/// write path.
///
/// The decision engine only ever sees this trait; the Postgres
/// implementation lives below and tests supply fakes.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user by username, the sole lookup key.
    async fn find_by_username(&self, username: &str) -> Result<Option<MqttUser>, sqlx::Error>;

    /// Record a successful login. Best-effort; callers fire and forget.
    async fn record_login(&self, username: &str) -> Result<(), sqlx::Error>;
}

/// Postgres-backed credential store.
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<MqttUser>, sqlx::Error> {
        UserRepo::find_by_username(&self.pool, username).await
    }

    async fn record_login(&self, username: &str) -> Result<(), sqlx::Error> {
        UserRepo::record_login(&self.pool, username).await
    }
}

/// Ephemeral projection of a user written to the cache on successful
/// authentication.
///
/// Keyed by `(username, password fingerprint)`; holds exactly the
/// fields needed to answer later checks without a store round-trip.
/// Entries expire by TTL and are never explicitly invalidated, so they
/// can be stale for up to the TTL after a credential change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAuthResult {
    pub username: String,
    pub client_id: Option<String>,
    pub is_superuser: bool,
    pub publish_acl: String,
    pub subscribe_acl: String,
}

impl From<&MqttUser> for CachedAuthResult {
    fn from(user: &MqttUser) -> Self {
        Self {
            username: user.username.clone(),
            client_id: user.client_id.clone(),
            is_superuser: user.is_superuser,
            publish_acl: user.publish_acl.clone(),
            subscribe_acl: user.subscribe_acl.clone(),
        }
    }
}
