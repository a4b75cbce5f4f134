//! Broker-facing decision endpoints.
//!
//! The broker POSTs here on every CONNECT, PUBLISH, and SUBSCRIBE, and
//! blocks on the answer. Denials are data, not HTTP errors: both allow
//! and deny answers come back as 200 with a `result` envelope. Only a
//! store failure surfaces as a 500, which the broker treats as a deny.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::engine::Decision;
use crate::error::AppResult;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Body of `POST /mqtt/auth`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub peer_addr: String,
    /// Forwarded by some brokers; not part of any decision.
    #[serde(default)]
    pub clean_session: Option<bool>,
}

/// Body of `POST /mqtt/acl/publish`.
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub peer_addr: String,
    /// Forwarded by some brokers; not part of any decision.
    #[serde(default)]
    pub qos: Option<u8>,
    #[serde(default)]
    pub retain: Option<bool>,
}

/// Body of `POST /mqtt/acl/subscribe`.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub peer_addr: String,
}

/// Body of `POST /mqtt/disconnect`.
#[derive(Debug, Deserialize)]
pub struct DisconnectRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub peer_addr: String,
}

/// Decision envelope: `{"result":"ok"}` or
/// `{"result":{"error":"<code>"}}`.
#[derive(Debug, Serialize)]
pub struct BrokerResponse {
    pub result: BrokerResult,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrokerResult {
    Ok(&'static str),
    Deny { error: &'static str },
}

impl From<Decision> for BrokerResponse {
    fn from(decision: Decision) -> Self {
        let result = match decision {
            Decision::Allow => BrokerResult::Ok("ok"),
            Decision::Deny(reason) => BrokerResult::Deny {
                error: reason.as_str(),
            },
        };
        Self { result }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /mqtt/auth
///
/// Decide a client connection attempt.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<BrokerResponse>> {
    let decision = state
        .engine
        .on_register(&req.client_id, &req.username, &req.password, &req.peer_addr)
        .await?;

    tracing::debug!(
        client_id = %req.client_id,
        username = %req.username,
        allowed = matches!(decision, Decision::Allow),
        "Register decision"
    );

    Ok(Json(BrokerResponse::from(decision)))
}

/// POST /mqtt/acl/publish
///
/// Decide a publish attempt.
pub async fn publish(
    State(state): State<AppState>,
    Json(req): Json<PublishRequest>,
) -> AppResult<Json<BrokerResponse>> {
    let decision = state
        .engine
        .on_publish(
            &req.client_id,
            &req.username,
            &req.topic,
            &req.payload,
            &req.peer_addr,
        )
        .await?;

    tracing::debug!(
        client_id = %req.client_id,
        username = %req.username,
        topic = %req.topic,
        allowed = matches!(decision, Decision::Allow),
        "Publish decision"
    );

    Ok(Json(BrokerResponse::from(decision)))
}

/// POST /mqtt/acl/subscribe
///
/// Decide a subscribe attempt over one or more topic filters.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> AppResult<Json<BrokerResponse>> {
    let decision = state
        .engine
        .on_subscribe(&req.client_id, &req.username, &req.topics, &req.peer_addr)
        .await?;

    tracing::debug!(
        client_id = %req.client_id,
        username = %req.username,
        topic_count = req.topics.len(),
        allowed = matches!(decision, Decision::Allow),
        "Subscribe decision"
    );

    Ok(Json(BrokerResponse::from(decision)))
}

/// POST /mqtt/disconnect
///
/// Notification only; the answer is always ok.
pub async fn disconnect(
    State(state): State<AppState>,
    Json(req): Json<DisconnectRequest>,
) -> Json<BrokerResponse> {
    state
        .engine
        .on_disconnect(&req.client_id, &req.username, &req.peer_addr);

    tracing::debug!(
        client_id = %req.client_id,
        username = %req.username,
        "Disconnect noted"
    );

    Json(BrokerResponse::from(Decision::Allow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DenyReason;

    #[test]
    fn allow_serializes_as_ok_string() {
        let response = BrokerResponse::from(Decision::Allow);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"result":"ok"}"#);
    }

    #[test]
    fn deny_serializes_as_error_object() {
        let response = BrokerResponse::from(Decision::Deny(DenyReason::TopicNotAllowed));
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"result":{"error":"topic_not_allowed"}}"#);
    }

    #[test]
    fn register_request_fields_default_to_empty() {
        let req: RegisterRequest = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.password, "");
        assert_eq!(req.client_id, "");
        assert_eq!(req.peer_addr, "");
    }

    #[test]
    fn subscribe_request_accepts_topic_list() {
        let req: SubscribeRequest =
            serde_json::from_str(r#"{"username":"alice","topics":["a/b","c/#"]}"#).unwrap();
        assert_eq!(req.topics, vec!["a/b".to_string(), "c/#".to_string()]);
    }
}
