//! Integration tests for the webhook trigger engine.
//!
//! Deliveries run against a real HTTP server bound to an ephemeral
//! port; persistence and notification go through in-memory fakes so
//! the retry ledger can be asserted on directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use mqguard_api::trigger::{
    ExecutionNotifier, ExecutionStore, ExecutionUpdate, WebhookTriggerEngine,
};
use mqguard_core::types::{DbId, Timestamp};
use mqguard_db::models::webhook::Webhook;
use mqguard_events::BrokerEvent;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct ExecRecord {
    status: String,
    attempt_count: i32,
    response_status: Option<i32>,
    error_message: Option<String>,
}

/// In-memory execution store serving a fixed webhook list.
struct MemoryStore {
    webhooks: Vec<Webhook>,
    executions: Mutex<HashMap<DbId, ExecRecord>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    fn new(webhooks: Vec<Webhook>) -> Arc<Self> {
        Arc::new(Self {
            webhooks,
            executions: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        })
    }

    fn execution(&self, id: DbId) -> Option<ExecRecord> {
        self.executions.lock().unwrap().get(&id).cloned()
    }

    fn execution_count(&self) -> usize {
        self.executions.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutionStore for MemoryStore {
    async fn webhooks_for_event(&self, _event_type: &str) -> Result<Vec<Webhook>, sqlx::Error> {
        Ok(self.webhooks.clone())
    }

    async fn create_execution(
        &self,
        _webhook_id: DbId,
        _event_type: &str,
        _event_timestamp: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.executions
            .lock()
            .unwrap()
            .insert(id, ExecRecord::default());
        Ok(id)
    }

    async fn record_attempt(
        &self,
        execution_id: DbId,
        status: &str,
        attempt_count: i32,
        response_status: Option<i32>,
        _response_time_ms: Option<i64>,
        _response_body: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let mut executions = self.executions.lock().unwrap();
        executions.insert(
            execution_id,
            ExecRecord {
                status: status.to_string(),
                attempt_count,
                response_status,
                error_message: error_message.map(str::to_string),
            },
        );
        Ok(())
    }
}

/// Notifier that records every update.
#[derive(Default)]
struct RecordingNotifier {
    updates: Mutex<Vec<ExecutionUpdate>>,
}

impl RecordingNotifier {
    fn statuses(&self) -> Vec<String> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.status.clone())
            .collect()
    }
}

impl ExecutionNotifier for RecordingNotifier {
    fn notify(&self, update: ExecutionUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

// ---------------------------------------------------------------------------
// Test target server and helpers
// ---------------------------------------------------------------------------

/// Serve `/hook` on an ephemeral port: 500 for the first `fail_first`
/// hits, 200 afterwards.
async fn start_target(fail_first: usize) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = Arc::clone(&hits);

    let app = Router::new().route(
        "/hook",
        post(move || {
            let hits = Arc::clone(&handler_hits);
            async move {
                let n = hits.fetch_add(1, Ordering::SeqCst);
                if n < fail_first {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    StatusCode::OK
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/hook"), hits)
}

/// Serve `/hook` but hold every request longer than any test timeout.
async fn start_stalling_target() -> String {
    let app = Router::new().route(
        "/hook",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::OK
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/hook")
}

fn make_webhook(url: &str, retry_count: i32) -> Webhook {
    let now = chrono::Utc::now();
    Webhook {
        id: 7,
        name: "test hook".to_string(),
        url: url.to_string(),
        http_method: "POST".to_string(),
        content_type: "application/json".to_string(),
        headers: serde_json::json!({}),
        payload_template: None,
        auth_type: "none".to_string(),
        auth_secret: None,
        auth_header: None,
        timeout_secs: 1,
        retry_count,
        retry_delay_secs: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Poll until `predicate` holds or a deadline passes.
async fn wait_until(predicate: impl Fn() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("condition not met within deadline");
}

fn sample_event() -> BrokerEvent {
    BrokerEvent::new("auth.success").with_client("c1", "alice")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delivers_on_first_success() {
    let (url, hits) = start_target(0).await;
    let store = MemoryStore::new(vec![make_webhook(&url, 3)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Arc::new(WebhookTriggerEngine::new(store.clone(), notifier.clone()));

    engine.fire(sample_event()).await;

    wait_until(|| store.execution(1).is_some_and(|e| e.status == "success")).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let record = store.execution(1).unwrap();
    assert_eq!(record.attempt_count, 1);
    assert_eq!(record.response_status, Some(200));
    assert_eq!(record.error_message, None);
    assert_eq!(notifier.statuses(), vec!["success"]);
}

#[tokio::test]
async fn retries_until_success() {
    let (url, hits) = start_target(1).await;
    let store = MemoryStore::new(vec![make_webhook(&url, 2)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Arc::new(WebhookTriggerEngine::new(store.clone(), notifier.clone()));

    engine.fire(sample_event()).await;

    wait_until(|| store.execution(1).is_some_and(|e| e.status == "success")).await;
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    let record = store.execution(1).unwrap();
    assert_eq!(record.attempt_count, 2);
    assert_eq!(record.response_status, Some(200));
    // First attempt reported as pending, second as terminal success.
    assert_eq!(notifier.statuses(), vec!["pending", "success"]);
}

#[tokio::test]
async fn exhausted_retries_end_in_failed() {
    let (url, hits) = start_target(usize::MAX).await;
    let store = MemoryStore::new(vec![make_webhook(&url, 2)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Arc::new(WebhookTriggerEngine::new(store.clone(), notifier.clone()));

    engine.fire(sample_event()).await;

    wait_until(|| store.execution(1).is_some_and(|e| e.status == "failed")).await;

    // retry_count = 2 means three attempts in total.
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    let record = store.execution(1).unwrap();
    assert_eq!(record.attempt_count, 3);
    assert_eq!(record.response_status, Some(500));
    assert_eq!(record.error_message.as_deref(), Some("HTTP 500"));
    assert_eq!(notifier.statuses(), vec!["pending", "pending", "failed"]);
}

#[tokio::test]
async fn final_attempt_timeout_is_terminal_timeout() {
    let url = start_stalling_target().await;
    let store = MemoryStore::new(vec![make_webhook(&url, 0)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Arc::new(WebhookTriggerEngine::new(store.clone(), notifier.clone()));

    engine.fire(sample_event()).await;

    wait_until(|| store.execution(1).is_some_and(|e| e.status == "timeout")).await;

    let record = store.execution(1).unwrap();
    assert_eq!(record.attempt_count, 1);
    assert_eq!(record.response_status, None);
    assert!(record
        .error_message
        .as_deref()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn unreachable_target_fails_without_panicking() {
    // Nothing listens on this port.
    let store = MemoryStore::new(vec![make_webhook("http://127.0.0.1:1/hook", 1)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Arc::new(WebhookTriggerEngine::new(store.clone(), notifier.clone()));

    engine.fire(sample_event()).await;

    wait_until(|| store.execution(1).is_some_and(|e| e.status == "failed")).await;

    let record = store.execution(1).unwrap();
    assert_eq!(record.attempt_count, 2);
    assert_eq!(record.response_status, None);
}

#[tokio::test]
async fn no_matching_webhooks_is_a_noop() {
    let store = MemoryStore::new(vec![]);
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Arc::new(WebhookTriggerEngine::new(store.clone(), notifier.clone()));

    engine.fire(sample_event()).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.execution_count(), 0);
    assert!(notifier.statuses().is_empty());
}

#[tokio::test]
async fn one_event_fans_out_to_all_matching_webhooks() {
    let (url, hits) = start_target(0).await;
    let mut second = make_webhook(&url, 0);
    second.id = 8;
    let store = MemoryStore::new(vec![make_webhook(&url, 0), second]);
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Arc::new(WebhookTriggerEngine::new(store.clone(), notifier.clone()));

    engine.fire(sample_event()).await;

    wait_until(|| {
        store.execution(1).is_some_and(|e| e.status == "success")
            && store.execution(2).is_some_and(|e| e.status == "success")
    })
    .await;
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
