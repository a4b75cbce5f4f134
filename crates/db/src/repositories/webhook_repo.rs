//! Repository for the `webhooks`, `webhook_triggers`, and
//! `webhook_executions` tables.

use mqguard_core::types::DbId;
use sqlx::PgPool;

use crate::models::webhook::{Webhook, WebhookExecution, WebhookTrigger};

const WEBHOOK_COLUMNS: &str = "\
    id, name, url, http_method, content_type, headers, payload_template, \
    auth_type, auth_secret, auth_header, timeout_secs, retry_count, \
    retry_delay_secs, is_active, created_at, updated_at";

const TRIGGER_COLUMNS: &str = "id, webhook_id, event_type, is_active, created_at";

const EXECUTION_COLUMNS: &str = "\
    id, webhook_id, event_type, event_timestamp, status, attempt_count, \
    response_status, response_time_ms, response_body, error_message, \
    created_at, updated_at";

/// CRUD for webhooks, their triggers, and execution logs.
pub struct WebhookRepo;

impl WebhookRepo {
    // -----------------------------------------------------------------------
    // Webhook CRUD
    // -----------------------------------------------------------------------

    /// Create a new webhook.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        name: &str,
        url: &str,
        http_method: &str,
        content_type: &str,
        headers: &serde_json::Value,
        payload_template: Option<&str>,
        auth_type: &str,
        auth_secret: Option<&str>,
        auth_header: Option<&str>,
        timeout_secs: i32,
        retry_count: i32,
        retry_delay_secs: i32,
        is_active: bool,
    ) -> Result<Webhook, sqlx::Error> {
        let query = format!(
            "INSERT INTO webhooks \
                 (name, url, http_method, content_type, headers, payload_template, \
                  auth_type, auth_secret, auth_header, timeout_secs, retry_count, \
                  retry_delay_secs, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {WEBHOOK_COLUMNS}"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(name)
            .bind(url)
            .bind(http_method)
            .bind(content_type)
            .bind(headers)
            .bind(payload_template)
            .bind(auth_type)
            .bind(auth_secret)
            .bind(auth_header)
            .bind(timeout_secs)
            .bind(retry_count)
            .bind(retry_delay_secs)
            .bind(is_active)
            .fetch_one(pool)
            .await
    }

    /// List all webhooks, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Webhook>, sqlx::Error> {
        let query = format!("SELECT {WEBHOOK_COLUMNS} FROM webhooks ORDER BY created_at DESC");
        sqlx::query_as::<_, Webhook>(&query).fetch_all(pool).await
    }

    /// Find a webhook by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Webhook>, sqlx::Error> {
        let query = format!("SELECT {WEBHOOK_COLUMNS} FROM webhooks WHERE id = $1");
        sqlx::query_as::<_, Webhook>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Partially update a webhook.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        name: Option<&str>,
        url: Option<&str>,
        http_method: Option<&str>,
        content_type: Option<&str>,
        headers: Option<&serde_json::Value>,
        payload_template: Option<&str>,
        auth_type: Option<&str>,
        auth_secret: Option<&str>,
        auth_header: Option<&str>,
        timeout_secs: Option<i32>,
        retry_count: Option<i32>,
        retry_delay_secs: Option<i32>,
        is_active: Option<bool>,
    ) -> Result<Option<Webhook>, sqlx::Error> {
        let query = format!(
            "UPDATE webhooks SET \
                 name = COALESCE($2, name), \
                 url = COALESCE($3, url), \
                 http_method = COALESCE($4, http_method), \
                 content_type = COALESCE($5, content_type), \
                 headers = COALESCE($6, headers), \
                 payload_template = COALESCE($7, payload_template), \
                 auth_type = COALESCE($8, auth_type), \
                 auth_secret = COALESCE($9, auth_secret), \
                 auth_header = COALESCE($10, auth_header), \
                 timeout_secs = COALESCE($11, timeout_secs), \
                 retry_count = COALESCE($12, retry_count), \
                 retry_delay_secs = COALESCE($13, retry_delay_secs), \
                 is_active = COALESCE($14, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {WEBHOOK_COLUMNS}"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(id)
            .bind(name)
            .bind(url)
            .bind(http_method)
            .bind(content_type)
            .bind(headers)
            .bind(payload_template)
            .bind(auth_type)
            .bind(auth_secret)
            .bind(auth_header)
            .bind(timeout_secs)
            .bind(retry_count)
            .bind(retry_delay_secs)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete a webhook. Cascade deletes its triggers and executions.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active webhooks that have an active trigger for `event_type`.
    ///
    /// This is the fan-out selection query on the event path.
    pub async fn list_active_for_event(
        pool: &PgPool,
        event_type: &str,
    ) -> Result<Vec<Webhook>, sqlx::Error> {
        let query = format!(
            "SELECT {WEBHOOK_COLUMNS} FROM webhooks w \
             WHERE w.is_active = TRUE \
               AND EXISTS (SELECT 1 FROM webhook_triggers t \
                           WHERE t.webhook_id = w.id \
                             AND t.event_type = $1 \
                             AND t.is_active = TRUE)"
        );
        sqlx::query_as::<_, Webhook>(&query)
            .bind(event_type)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Trigger operations
    // -----------------------------------------------------------------------

    /// Create a trigger binding a webhook to an event type.
    pub async fn create_trigger(
        pool: &PgPool,
        webhook_id: DbId,
        event_type: &str,
    ) -> Result<WebhookTrigger, sqlx::Error> {
        let query = format!(
            "INSERT INTO webhook_triggers (webhook_id, event_type) \
             VALUES ($1, $2) \
             ON CONFLICT (webhook_id, event_type) \
                 DO UPDATE SET is_active = TRUE \
             RETURNING {TRIGGER_COLUMNS}"
        );
        sqlx::query_as::<_, WebhookTrigger>(&query)
            .bind(webhook_id)
            .bind(event_type)
            .fetch_one(pool)
            .await
    }

    /// List triggers for a webhook.
    pub async fn list_triggers(
        pool: &PgPool,
        webhook_id: DbId,
    ) -> Result<Vec<WebhookTrigger>, sqlx::Error> {
        let query = format!(
            "SELECT {TRIGGER_COLUMNS} FROM webhook_triggers \
             WHERE webhook_id = $1 ORDER BY event_type"
        );
        sqlx::query_as::<_, WebhookTrigger>(&query)
            .bind(webhook_id)
            .fetch_all(pool)
            .await
    }

    /// Enable or disable a trigger.
    pub async fn set_trigger_active(
        pool: &PgPool,
        trigger_id: DbId,
        is_active: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE webhook_triggers SET is_active = $2 WHERE id = $1")
            .bind(trigger_id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a trigger.
    pub async fn delete_trigger(pool: &PgPool, trigger_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM webhook_triggers WHERE id = $1")
            .bind(trigger_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Execution log operations
    // -----------------------------------------------------------------------

    /// Create a pending execution row at trigger time.
    pub async fn create_execution(
        pool: &PgPool,
        webhook_id: DbId,
        event_type: &str,
        event_timestamp: chrono::DateTime<chrono::Utc>,
    ) -> Result<WebhookExecution, sqlx::Error> {
        let query = format!(
            "INSERT INTO webhook_executions (webhook_id, event_type, event_timestamp) \
             VALUES ($1, $2, $3) \
             RETURNING {EXECUTION_COLUMNS}"
        );
        sqlx::query_as::<_, WebhookExecution>(&query)
            .bind(webhook_id)
            .bind(event_type)
            .bind(event_timestamp)
            .fetch_one(pool)
            .await
    }

    /// Update an execution row in place as attempts proceed.
    ///
    /// Called after every attempt; the final call carries a terminal
    /// `status`.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_attempt(
        pool: &PgPool,
        execution_id: DbId,
        status: &str,
        attempt_count: i32,
        response_status: Option<i32>,
        response_time_ms: Option<i64>,
        response_body: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE webhook_executions SET \
                 status = $2, \
                 attempt_count = $3, \
                 response_status = $4, \
                 response_time_ms = $5, \
                 response_body = $6, \
                 error_message = $7, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(execution_id)
        .bind(status)
        .bind(attempt_count)
        .bind(response_status)
        .bind(response_time_ms)
        .bind(response_body)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List executions for a webhook, newest first.
    pub async fn list_executions(
        pool: &PgPool,
        webhook_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<WebhookExecution>, sqlx::Error> {
        let query = format!(
            "SELECT {EXECUTION_COLUMNS} FROM webhook_executions \
             WHERE webhook_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, WebhookExecution>(&query)
            .bind(webhook_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find a single execution by id.
    pub async fn find_execution(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<WebhookExecution>, sqlx::Error> {
        let query = format!("SELECT {EXECUTION_COLUMNS} FROM webhook_executions WHERE id = $1");
        sqlx::query_as::<_, WebhookExecution>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
