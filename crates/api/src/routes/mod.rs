//! Route tree.
//!
//! Broker decision endpoints and the health check live at the root;
//! the admin surface sits under `/api/v1`; the execution feed upgrades
//! at `/ws/executions`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{broker, health, users, webhooks};
use crate::state::AppState;
use crate::ws;

/// Root-level routes the broker calls on its hot path.
///
/// ```text
/// POST /mqtt/auth           -> register decision
/// POST /mqtt/acl/publish    -> publish decision
/// POST /mqtt/acl/subscribe  -> subscribe decision
/// POST /mqtt/disconnect     -> disconnect notification
/// GET  /health              -> service health
/// ```
pub fn broker_router() -> Router<AppState> {
    Router::new()
        .route("/mqtt/auth", post(broker::register))
        .route("/mqtt/acl/publish", post(broker::publish))
        .route("/mqtt/acl/subscribe", post(broker::subscribe))
        .route("/mqtt/disconnect", post(broker::disconnect))
        .route("/health", get(health::health_check))
}

/// The `/api/v1` admin surface.
///
/// ```text
/// /users                           list, create
/// /users/{id}                      get, update, delete
///
/// /webhooks                        list, create
/// /webhooks/{id}                   get, update, delete
/// /webhooks/{id}/triggers          list, create
/// /webhooks/triggers/{id}          set active, delete
/// /webhooks/{id}/executions        execution history
/// /webhooks/executions/{id}        single execution
/// ```
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/webhooks",
            get(webhooks::list_webhooks).post(webhooks::create_webhook),
        )
        .route(
            "/webhooks/{id}",
            get(webhooks::get_webhook)
                .put(webhooks::update_webhook)
                .delete(webhooks::delete_webhook),
        )
        .route(
            "/webhooks/{id}/triggers",
            get(webhooks::list_triggers).post(webhooks::create_trigger),
        )
        .route(
            "/webhooks/triggers/{id}",
            put(webhooks::set_trigger_active).delete(webhooks::delete_trigger),
        )
        .route("/webhooks/{id}/executions", get(webhooks::list_executions))
        .route("/webhooks/executions/{id}", get(webhooks::get_execution))
}

/// The live execution feed.
pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/executions", get(ws::executions_feed_handler))
}
