//! Server configuration loaded from environment variables.

/// Runtime configuration.
///
/// All fields have defaults suitable for local development; override
/// via environment variables in production.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8084`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Redis URL for the primary cache tier; unset runs local-only.
    pub redis_url: Option<String>,
    /// TTL for cached authentication results in seconds (default: `300`).
    pub auth_cache_ttl_secs: u64,
    /// Cool-down after a cache-backend failure in seconds (default: `30`).
    pub cache_cooldown_secs: u64,
    /// Reserved topic prefix only superusers may publish/subscribe to
    /// (default: `admin/`).
    pub admin_topic_prefix: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `8084`                  |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `REDIS_URL`            | unset (local-only)      |
    /// | `AUTH_CACHE_TTL_SECS`  | `300`                   |
    /// | `CACHE_COOLDOWN_SECS`  | `30`                    |
    /// | `ADMIN_TOPIC_PREFIX`   | `admin/`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8084".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let redis_url = std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        let auth_cache_ttl_secs: u64 = std::env::var("AUTH_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("AUTH_CACHE_TTL_SECS must be a valid u64");

        let cache_cooldown_secs: u64 = std::env::var("CACHE_COOLDOWN_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("CACHE_COOLDOWN_SECS must be a valid u64");

        let admin_topic_prefix =
            std::env::var("ADMIN_TOPIC_PREFIX").unwrap_or_else(|_| "admin/".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            redis_url,
            auth_cache_ttl_secs,
            cache_cooldown_secs,
            admin_topic_prefix,
        }
    }
}
