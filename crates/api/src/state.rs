use std::sync::Arc;

use mqguard_cache::HybridCache;
use mqguard_events::EventBus;

use crate::config::ServerConfig;
use crate::engine::AuthDecisionEngine;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: mqguard_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Two-tier auth result cache (also probed by the health endpoint).
    pub cache: Arc<HybridCache>,
    /// Broker event bus.
    pub event_bus: Arc<EventBus>,
    /// The connect/publish/subscribe decision engine.
    pub engine: Arc<AuthDecisionEngine>,
    /// WebSocket connections receiving the execution feed.
    pub ws_manager: Arc<WsManager>,
}
