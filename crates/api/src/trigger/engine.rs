//! The webhook fan-out and retry engine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mqguard_db::models::webhook::{ExecutionStatus, Webhook, WebhookAuthType};
use mqguard_events::BrokerEvent;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tokio::sync::broadcast;

use crate::trigger::notifier::{ExecutionNotifier, ExecutionUpdate};
use crate::trigger::store::ExecutionStore;
use crate::trigger::template::render_payload;

/// Result of a single HTTP attempt.
enum AttemptOutcome {
    /// 2xx response.
    Success { status: u16, body: String },
    /// Non-2xx response.
    HttpError { status: u16, body: String },
    /// The configured per-webhook timeout elapsed.
    Timeout,
    /// Connection or protocol failure.
    Transport(String),
}

/// Consumes broker events and delivers them to matching webhooks.
///
/// Fire-and-forget from the decision path: events arrive over the
/// broadcast bus, each matching webhook runs on its own spawned task,
/// and nothing here can propagate an error back to the broker-facing
/// handlers.
pub struct WebhookTriggerEngine {
    store: Arc<dyn ExecutionStore>,
    notifier: Arc<dyn ExecutionNotifier>,
    http: reqwest::Client,
}

impl WebhookTriggerEngine {
    pub fn new(store: Arc<dyn ExecutionStore>, notifier: Arc<dyn ExecutionNotifier>) -> Self {
        Self {
            store,
            notifier,
            // Timeouts are configured per webhook on each request.
            http: reqwest::Client::new(),
        }
    }

    /// Run the consumption loop.
    ///
    /// Exits when the event bus is dropped (`RecvError::Closed`).
    pub async fn run(self: Arc<Self>, mut receiver: broadcast::Receiver<BrokerEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => Arc::clone(&self).fire(event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Webhook trigger engine lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, webhook trigger engine shutting down");
                    break;
                }
            }
        }
    }

    /// Fan one event out to every matching webhook.
    ///
    /// Selection errors are logged and swallowed; each delivery runs on
    /// its own detached task so webhooks never block each other.
    pub async fn fire(self: Arc<Self>, event: BrokerEvent) {
        let webhooks = match self.store.webhooks_for_event(&event.event_type).await {
            Ok(webhooks) => webhooks,
            Err(e) => {
                tracing::error!(
                    event_type = %event.event_type,
                    error = %e,
                    "Failed to query matching webhooks"
                );
                return;
            }
        };

        if webhooks.is_empty() {
            tracing::debug!(event_type = %event.event_type, "No webhooks match event type");
            return;
        }

        tracing::info!(
            event_type = %event.event_type,
            webhook_count = webhooks.len(),
            "Dispatching event to webhooks"
        );

        for webhook in webhooks {
            let engine = Arc::clone(&self);
            let event = event.clone();
            tokio::spawn(async move {
                engine.execute_webhook(webhook, event).await;
            });
        }
    }

    /// Deliver one event to one webhook: bounded sequential retry loop
    /// with a fixed delay between attempts.
    ///
    /// Attempts run `0..=retry_count`; the loop stops at the first 2xx
    /// (`Success`), after exhausting retries (`Failed`), or on a
    /// timeout of the final attempt (`Timeout`). Every attempt updates
    /// the execution row and pushes a status notification.
    async fn execute_webhook(&self, webhook: Webhook, event: BrokerEvent) {
        let execution_id = match self
            .store
            .create_execution(webhook.id, &event.event_type, event.timestamp)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(
                    webhook_id = webhook.id,
                    event_type = %event.event_type,
                    error = %e,
                    "Failed to create execution record"
                );
                return;
            }
        };

        let total_attempts = webhook.retry_count.max(0) + 1;
        let retry_delay = Duration::from_secs(webhook.retry_delay_secs.max(0) as u64);
        let body = render_payload(webhook.payload_template.as_deref(), &event);

        for attempt in 1..=total_attempts {
            let is_last = attempt == total_attempts;

            let start = Instant::now();
            let outcome = self.send_once(&webhook, body.clone()).await;
            let elapsed_ms = start.elapsed().as_millis() as i64;

            let (status, response_status, response_body, error_message) = match &outcome {
                AttemptOutcome::Success { status, body } => (
                    ExecutionStatus::Success,
                    Some(i32::from(*status)),
                    Some(body.as_str()),
                    None,
                ),
                AttemptOutcome::HttpError { status, body } => (
                    if is_last {
                        ExecutionStatus::Failed
                    } else {
                        ExecutionStatus::Pending
                    },
                    Some(i32::from(*status)),
                    Some(body.as_str()),
                    Some(format!("HTTP {status}")),
                ),
                AttemptOutcome::Timeout => (
                    if is_last {
                        ExecutionStatus::Timeout
                    } else {
                        ExecutionStatus::Pending
                    },
                    None,
                    None,
                    Some(format!(
                        "Request timed out after {}s",
                        webhook.timeout_secs.max(1)
                    )),
                ),
                AttemptOutcome::Transport(msg) => (
                    if is_last {
                        ExecutionStatus::Failed
                    } else {
                        ExecutionStatus::Pending
                    },
                    None,
                    None,
                    Some(msg.clone()),
                ),
            };

            if let Err(e) = self
                .store
                .record_attempt(
                    execution_id,
                    status.as_str(),
                    attempt,
                    response_status,
                    Some(elapsed_ms),
                    response_body,
                    error_message.as_deref(),
                )
                .await
            {
                tracing::error!(
                    execution_id,
                    webhook_id = webhook.id,
                    error = %e,
                    "Failed to update execution record"
                );
            }

            self.notifier.notify(ExecutionUpdate {
                webhook_id: webhook.id,
                execution_id,
                status: status.as_str().to_string(),
                attempt,
                response_time_ms: Some(elapsed_ms),
            });

            if status == ExecutionStatus::Success {
                tracing::info!(
                    webhook_id = webhook.id,
                    execution_id,
                    attempt,
                    elapsed_ms,
                    "Webhook delivery succeeded"
                );
                return;
            }

            if is_last {
                tracing::warn!(
                    webhook_id = webhook.id,
                    execution_id,
                    attempt,
                    final_status = status.as_str(),
                    error = error_message.as_deref().unwrap_or(""),
                    "Webhook delivery exhausted retries"
                );
                return;
            }

            tokio::time::sleep(retry_delay).await;
        }
    }

    /// Build and send one HTTP request per the webhook configuration.
    async fn send_once(&self, webhook: &Webhook, body: String) -> AttemptOutcome {
        let method =
            Method::from_bytes(webhook.http_method.as_bytes()).unwrap_or(Method::POST);
        let timeout = Duration::from_secs(webhook.timeout_secs.max(1) as u64);

        let mut request = self
            .http
            .request(method, &webhook.url)
            .timeout(timeout)
            .header(CONTENT_TYPE, &webhook.content_type)
            .body(body);

        if let Some(headers) = webhook.headers.as_object() {
            for (name, value) in headers {
                if let Some(value) = value.as_str() {
                    request = request.header(name.as_str(), value);
                }
            }
        }

        match WebhookAuthType::parse(&webhook.auth_type) {
            WebhookAuthType::None => {}
            WebhookAuthType::Bearer => {
                if let Some(secret) = &webhook.auth_secret {
                    request = request.header(AUTHORIZATION, format!("Bearer {secret}"));
                }
            }
            WebhookAuthType::Basic => {
                if let Some(secret) = &webhook.auth_secret {
                    use base64::prelude::*;
                    let encoded = BASE64_STANDARD.encode(secret.as_bytes());
                    request = request.header(AUTHORIZATION, format!("Basic {encoded}"));
                }
            }
            WebhookAuthType::ApiKey => {
                if let (Some(header), Some(secret)) = (&webhook.auth_header, &webhook.auth_secret)
                {
                    request = request.header(header.as_str(), secret.as_str());
                }
            }
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response
                    .text()
                    .await
                    .unwrap_or_default()
                    .chars()
                    .take(4096)
                    .collect::<String>();

                if (200..300).contains(&status) {
                    AttemptOutcome::Success { status, body }
                } else {
                    AttemptOutcome::HttpError { status, body }
                }
            }
            Err(e) if e.is_timeout() => AttemptOutcome::Timeout,
            Err(e) if e.is_connect() => {
                AttemptOutcome::Transport(format!("Connection failed: {e}"))
            }
            Err(e) => AttemptOutcome::Transport(format!("Request error: {e}")),
        }
    }
}
