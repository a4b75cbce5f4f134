//! Execution store seam.

use async_trait::async_trait;
use mqguard_core::types::{DbId, Timestamp};
use mqguard_db::models::webhook::Webhook;
use mqguard_db::repositories::WebhookRepo;
use mqguard_db::DbPool;

/// Persistence boundary of the trigger engine: webhook/trigger
/// configuration reads and execution-log writes.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Active webhooks holding an active trigger for `event_type`.
    async fn webhooks_for_event(&self, event_type: &str) -> Result<Vec<Webhook>, sqlx::Error>;

    /// Create a pending execution row; returns its id.
    async fn create_execution(
        &self,
        webhook_id: DbId,
        event_type: &str,
        event_timestamp: Timestamp,
    ) -> Result<DbId, sqlx::Error>;

    /// Update the execution row after an attempt (terminal or not).
    #[allow(clippy::too_many_arguments)]
    async fn record_attempt(
        &self,
        execution_id: DbId,
        status: &str,
        attempt_count: i32,
        response_status: Option<i32>,
        response_time_ms: Option<i64>,
        response_body: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error>;
}

/// Postgres-backed execution store.
pub struct PgExecutionStore {
    pool: DbPool,
}

impl PgExecutionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExecutionStore for PgExecutionStore {
    async fn webhooks_for_event(&self, event_type: &str) -> Result<Vec<Webhook>, sqlx::Error> {
        WebhookRepo::list_active_for_event(&self.pool, event_type).await
    }

    async fn create_execution(
        &self,
        webhook_id: DbId,
        event_type: &str,
        event_timestamp: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        let execution =
            WebhookRepo::create_execution(&self.pool, webhook_id, event_type, event_timestamp)
                .await?;
        Ok(execution.id)
    }

    async fn record_attempt(
        &self,
        execution_id: DbId,
        status: &str,
        attempt_count: i32,
        response_status: Option<i32>,
        response_time_ms: Option<i64>,
        response_body: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        WebhookRepo::record_attempt(
            &self.pool,
            execution_id,
            status,
            attempt_count,
            response_status,
            response_time_ms,
            response_body,
            error_message,
        )
        .await
    }
}
