//! Webhook, trigger, and execution-log models.

use mqguard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// How a webhook authenticates against its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAuthType {
    None,
    /// `Authorization: Bearer <secret>`
    Bearer,
    /// `Authorization: Basic <secret base64-encoded>`
    Basic,
    /// `<auth_header>: <secret>`
    ApiKey,
}

impl WebhookAuthType {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookAuthType::None => "none",
            WebhookAuthType::Bearer => "bearer",
            WebhookAuthType::Basic => "basic",
            WebhookAuthType::ApiKey => "api_key",
        }
    }

    /// Parse the stored text value; unknown values fall back to `None`.
    pub fn parse(s: &str) -> Self {
        match s {
            "bearer" => WebhookAuthType::Bearer,
            "basic" => WebhookAuthType::Basic,
            "api_key" => WebhookAuthType::ApiKey,
            _ => WebhookAuthType::None,
        }
    }
}

/// Terminal and in-flight states of a webhook execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Success,
    Failed,
    Timeout,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Timeout => "timeout",
        }
    }

    /// Anything other than `Pending` will not change further.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Pending)
    }
}

/// A row from the `webhooks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Webhook {
    pub id: DbId,
    pub name: String,
    pub url: String,
    pub http_method: String,
    pub content_type: String,
    /// JSON object of extra request headers.
    pub headers: serde_json::Value,
    /// Optional payload template; `None` means the event is serialized
    /// as-is.
    pub payload_template: Option<String>,
    pub auth_type: String,
    #[serde(skip_serializing)]
    pub auth_secret: Option<String>,
    pub auth_header: Option<String>,
    pub timeout_secs: i32,
    /// Retries after the first attempt; total attempts = retry_count + 1.
    pub retry_count: i32,
    pub retry_delay_secs: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `webhook_triggers` table: binds a webhook to one
/// event type.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookTrigger {
    pub id: DbId,
    pub webhook_id: DbId,
    pub event_type: String,
    pub is_active: bool,
    pub created_at: Timestamp,
}

/// A row from the `webhook_executions` table: one delivery attempt set.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WebhookExecution {
    pub id: DbId,
    pub webhook_id: DbId,
    pub event_type: String,
    pub event_timestamp: Timestamp,
    pub status: String,
    /// Attempts performed so far (1-based once the first attempt runs).
    pub attempt_count: i32,
    pub response_status: Option<i32>,
    pub response_time_ms: Option<i64>,
    pub response_body: Option<String>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a webhook through the admin surface.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWebhook {
    pub name: String,
    pub url: String,
    pub http_method: Option<String>,
    pub content_type: Option<String>,
    pub headers: Option<serde_json::Value>,
    pub payload_template: Option<String>,
    pub auth_type: Option<WebhookAuthType>,
    pub auth_secret: Option<String>,
    pub auth_header: Option<String>,
    pub timeout_secs: Option<i32>,
    pub retry_count: Option<i32>,
    pub retry_delay_secs: Option<i32>,
    pub is_active: Option<bool>,
    /// Event types to create active triggers for.
    pub event_types: Option<Vec<String>>,
}

/// DTO for updating a webhook through the admin surface.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateWebhook {
    pub name: Option<String>,
    pub url: Option<String>,
    pub http_method: Option<String>,
    pub content_type: Option<String>,
    pub headers: Option<serde_json::Value>,
    pub payload_template: Option<String>,
    pub auth_type: Option<WebhookAuthType>,
    pub auth_secret: Option<String>,
    pub auth_header: Option<String>,
    pub timeout_secs: Option<i32>,
    pub retry_count: Option<i32>,
    pub retry_delay_secs: Option<i32>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_type_round_trips_through_text() {
        for t in [
            WebhookAuthType::None,
            WebhookAuthType::Bearer,
            WebhookAuthType::Basic,
            WebhookAuthType::ApiKey,
        ] {
            assert_eq!(WebhookAuthType::parse(t.as_str()), t);
        }
        assert_eq!(WebhookAuthType::parse("bogus"), WebhookAuthType::None);
    }

    #[test]
    fn pending_is_the_only_non_terminal_status() {
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(ExecutionStatus::Success.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Timeout.is_terminal());
    }
}
