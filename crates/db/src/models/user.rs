//! MQTT user model and admin DTOs.

use mqguard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
///
/// **Note:** `password_hash` is never serialized to responses. The
/// `publish_acl` / `subscribe_acl` fields are comma-separated topic
/// pattern lists; an empty list means the user is unrestricted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MqttUser {
    pub id: DbId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Optional bound client identifier. When set, only this client id
    /// may authenticate as the user.
    pub client_id: Option<String>,
    pub is_superuser: bool,
    pub is_active: bool,
    pub publish_acl: String,
    pub subscribe_acl: String,
    /// Bumped on credential changes; the decision path does not read it.
    pub cache_version: DbId,
    pub login_count: i64,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user through the admin surface.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub client_id: Option<String>,
    pub is_superuser: Option<bool>,
    pub publish_acl: Option<String>,
    pub subscribe_acl: Option<String>,
}

/// DTO for updating a user through the admin surface.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUser {
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
    pub publish_acl: Option<String>,
    pub subscribe_acl: Option<String>,
}
