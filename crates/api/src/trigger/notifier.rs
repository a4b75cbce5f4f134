//! Execution-status notification seam.
//!
//! Each webhook attempt pushes a status tuple to an external real-time
//! channel. The trigger engine depends on this interface but does not
//! implement the transport; the WebSocket implementation lives here for
//! wiring convenience and tests use a recording fake.

use std::sync::Arc;

use axum::extract::ws::Message;
use mqguard_core::types::DbId;
use serde::Serialize;

use crate::ws::WsManager;

/// One status push, keyed by webhook id.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionUpdate {
    pub webhook_id: DbId,
    pub execution_id: DbId,
    /// `pending` while attempts remain, otherwise terminal.
    pub status: String,
    pub attempt: i32,
    pub response_time_ms: Option<i64>,
}

/// Send-and-forget status channel. No acknowledgment, no errors back.
pub trait ExecutionNotifier: Send + Sync {
    fn notify(&self, update: ExecutionUpdate);
}

/// Pushes updates to all connected dashboard WebSocket clients.
pub struct WsNotifier {
    ws_manager: Arc<WsManager>,
}

impl WsNotifier {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }
}

impl ExecutionNotifier for WsNotifier {
    fn notify(&self, update: ExecutionUpdate) {
        let msg = match serde_json::to_string(&update) {
            Ok(json) => Message::Text(json.into()),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize execution update");
                return;
            }
        };
        let ws_manager = Arc::clone(&self.ws_manager);
        // Detached: the retry loop never waits on slow clients.
        tokio::spawn(async move {
            ws_manager.broadcast(msg).await;
        });
    }
}

/// Discards every update. Used where no channel is wired up.
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
    fn notify(&self, _update: ExecutionUpdate) {}
}
