//! Repository for the `users` table.

use mqguard_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::MqttUser;

const USER_COLUMNS: &str = "\
    id, username, password_hash, client_id, is_superuser, is_active, \
    publish_acl, subscribe_acl, cache_version, login_count, \
    last_login_at, created_at, updated_at";

/// Provides lookups and mutations for MQTT users.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by username (the sole lookup key on the hot path).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<MqttUser>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, MqttUser>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MqttUser>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, MqttUser>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all users ordered by username.
    pub async fn list(pool: &PgPool) -> Result<Vec<MqttUser>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
        sqlx::query_as::<_, MqttUser>(&query).fetch_all(pool).await
    }

    /// Create a user. `password_hash` must already be an Argon2 PHC string.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        username: &str,
        password_hash: &str,
        client_id: Option<&str>,
        is_superuser: bool,
        publish_acl: &str,
        subscribe_acl: &str,
    ) -> Result<MqttUser, sqlx::Error> {
        let query = format!(
            "INSERT INTO users \
                 (username, password_hash, client_id, is_superuser, publish_acl, subscribe_acl) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, MqttUser>(&query)
            .bind(username)
            .bind(password_hash)
            .bind(client_id)
            .bind(is_superuser)
            .bind(publish_acl)
            .bind(subscribe_acl)
            .fetch_one(pool)
            .await
    }

    /// Partially update a user.
    ///
    /// When the password hash or active flag changes, `cache_version` is
    /// bumped so cached auth projections can (eventually) be keyed off
    /// it. The decision path does not read the marker today; entries
    /// stay valid until their TTL expires.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        password_hash: Option<&str>,
        client_id: Option<&str>,
        is_superuser: Option<bool>,
        is_active: Option<bool>,
        publish_acl: Option<&str>,
        subscribe_acl: Option<&str>,
    ) -> Result<Option<MqttUser>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET \
                 password_hash = COALESCE($2, password_hash), \
                 client_id = COALESCE($3, client_id), \
                 is_superuser = COALESCE($4, is_superuser), \
                 is_active = COALESCE($5, is_active), \
                 publish_acl = COALESCE($6, publish_acl), \
                 subscribe_acl = COALESCE($7, subscribe_acl), \
                 cache_version = cache_version + \
                     CASE WHEN $2 IS NOT NULL OR $5 IS NOT NULL THEN 1 ELSE 0 END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, MqttUser>(&query)
            .bind(id)
            .bind(password_hash)
            .bind(client_id)
            .bind(is_superuser)
            .bind(is_active)
            .bind(publish_acl)
            .bind(subscribe_acl)
            .fetch_optional(pool)
            .await
    }

    /// Delete a user by id.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Record a successful login: bump the counter and stamp the time.
    pub async fn record_login(pool: &PgPool, username: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET login_count = login_count + 1, last_login_at = NOW() \
             WHERE username = $1",
        )
        .bind(username)
        .execute(pool)
        .await?;
        Ok(())
    }
}
