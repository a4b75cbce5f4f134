use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mqguard_api::config::ServerConfig;
use mqguard_api::engine::{AuthDecisionEngine, PgCredentialStore};
use mqguard_api::trigger::{PgExecutionStore, WebhookTriggerEngine, WsNotifier};
use mqguard_api::{routes, state, ws};

use mqguard_cache::{BackendHealth, HybridCache, RedisBackend};
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mqguard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = mqguard_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    mqguard_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    mqguard_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Auth cache ---
    // A missing or unreachable Redis is not fatal; the service degrades
    // to the in-process tier and re-probes after the cool-down.
    let redis_backend = match &config.redis_url {
        Some(url) => match RedisBackend::connect(url).await {
            Ok(backend) => {
                tracing::info!("Connected to Redis cache backend");
                Some(Arc::new(backend) as Arc<dyn mqguard_cache::CacheBackend>)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable at startup, running local-only");
                None
            }
        },
        None => {
            tracing::info!("No REDIS_URL configured, running local-only cache");
            None
        }
    };
    let cache = Arc::new(HybridCache::new(
        redis_backend,
        BackendHealth::new(),
        Duration::from_secs(config.cache_cooldown_secs),
    ));

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager));

    // --- Event bus ---
    let event_bus = Arc::new(mqguard_events::EventBus::default());
    tracing::info!("Event bus created");

    // --- Decision engine ---
    let engine = Arc::new(AuthDecisionEngine::new(
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::clone(&cache),
        Arc::clone(&event_bus),
        Duration::from_secs(config.auth_cache_ttl_secs),
        config.admin_topic_prefix.clone(),
    ));

    // --- Webhook trigger engine ---
    let trigger_engine = Arc::new(WebhookTriggerEngine::new(
        Arc::new(PgExecutionStore::new(pool.clone())),
        Arc::new(WsNotifier::new(Arc::clone(&ws_manager))),
    ));
    let trigger_handle = tokio::spawn(trigger_engine.run(event_bus.subscribe()));
    tracing::info!("Webhook trigger engine started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        cache: Arc::clone(&cache),
        event_bus: Arc::clone(&event_bus),
        engine,
        ws_manager: Arc::clone(&ws_manager),
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Broker decision endpoints and health at root level.
        .merge(routes::broker_router())
        // Admin surface.
        .nest("/api/v1", routes::admin_router())
        // Live execution feed.
        .merge(routes::ws_router())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Drop the event bus sender to close the broadcast channel, which
    // signals the trigger engine to finish its loop.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), trigger_handle).await;
    tracing::info!("Webhook trigger engine stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining execution feed connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Termination signal received, shutting down");
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut origins = Vec::with_capacity(config.cors_origins.len());
    for origin in &config.cors_origins {
        let parsed = origin
            .parse()
            .unwrap_or_else(|e| panic!("Invalid CORS origin '{origin}': {e}"));
        origins.push(parsed);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
