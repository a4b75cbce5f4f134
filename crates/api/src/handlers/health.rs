//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether the primary cache tier is reachable. `true` also when no
    /// backend is configured and the service runs local-only.
    pub cache_healthy: bool,
}

/// GET /health -- service, database, and cache-tier health.
///
/// The cache answer comes from the demotion state, not a live probe;
/// a backend in cool-down reports unhealthy until the next successful
/// attempt promotes it back.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = mqguard_db::health_check(&state.pool).await.is_ok();
    let cache_healthy = !state.cache.has_backend() || state.cache.backend_reachable();

    let status = if db_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        cache_healthy,
    })
}
