//! The two-tier cache and its backend-health state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::CacheBackend;
use crate::local::LocalCache;

/// Default interval the primary stays demoted after a failure.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Process-wide reachability state for the primary tier.
///
/// Owned by the cache and injected at construction so tests can swap
/// it. Reads of this state are not linearizable with writes; staleness
/// is bounded by the cool-down interval, which at worst costs one extra
/// failing call against a down backend.
pub struct BackendHealth {
    reachable: AtomicBool,
    last_failure: Mutex<Option<Instant>>,
}

impl BackendHealth {
    /// Start optimistic: the backend is assumed reachable until a call
    /// fails.
    pub fn new() -> Self {
        Self {
            reachable: AtomicBool::new(true),
            last_failure: Mutex::new(None),
        }
    }

    /// Whether the primary tier is currently believed reachable.
    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::Relaxed)
    }

    /// Whether a primary operation should be attempted: either the
    /// backend is up, or the cool-down has elapsed and this call doubles
    /// as the re-probe.
    fn allow_attempt(&self, cooldown: Duration) -> bool {
        if self.reachable.load(Ordering::Relaxed) {
            return true;
        }
        let last = self.last_failure.lock().unwrap_or_else(|e| e.into_inner());
        match *last {
            Some(at) => at.elapsed() >= cooldown,
            None => true,
        }
    }

    fn mark_up(&self) {
        self.reachable.store(true, Ordering::Relaxed);
    }

    fn mark_down(&self) {
        self.reachable.store(false, Ordering::Relaxed);
        let mut last = self.last_failure.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(Instant::now());
    }
}

impl Default for BackendHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-tier cache: primary shared backend plus local in-process
/// fallback.
pub struct HybridCache {
    local: LocalCache,
    primary: Option<Arc<dyn CacheBackend>>,
    health: BackendHealth,
    cooldown: Duration,
}

impl HybridCache {
    /// Build a cache with an optional primary backend.
    ///
    /// `primary = None` runs local-only, which is also the degraded mode
    /// entered when the backend misbehaves.
    pub fn new(
        primary: Option<Arc<dyn CacheBackend>>,
        health: BackendHealth,
        cooldown: Duration,
    ) -> Self {
        Self {
            local: LocalCache::new(),
            primary,
            health,
            cooldown,
        }
    }

    /// Local-only cache, mainly for tests and primary-less deployments.
    pub fn local_only() -> Self {
        Self::new(None, BackendHealth::new(), DEFAULT_COOLDOWN)
    }

    /// Whether a primary backend is configured at all.
    pub fn has_backend(&self) -> bool {
        self.primary.is_some()
    }

    /// Whether the primary tier is currently believed reachable.
    /// Local-only caches report `false`.
    pub fn backend_reachable(&self) -> bool {
        self.primary.is_some() && self.health.is_reachable()
    }

    /// Fetch and deserialize a value.
    ///
    /// The primary is consulted first while healthy; a primary error
    /// demotes to local-only and is treated as a miss on that tier.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(primary) = &self.primary {
            if self.health.allow_attempt(self.cooldown) {
                match primary.get(key).await {
                    Ok(Some(raw)) => {
                        self.health.mark_up();
                        match serde_json::from_str(&raw) {
                            Ok(value) => return Some(value),
                            Err(e) => {
                                tracing::warn!(key, error = %e, "Undecodable primary cache entry");
                            }
                        }
                    }
                    Ok(None) => {
                        self.health.mark_up();
                    }
                    Err(e) => {
                        tracing::warn!(key, error = %e, "Primary cache read failed, demoting");
                        self.health.mark_down();
                    }
                }
            }
        }

        let raw = self.local.get(key).await?;
        serde_json::from_str(&raw).ok()
    }

    /// Store a value in both tiers.
    ///
    /// The local write is unconditional; the primary write is
    /// best-effort and demotes on failure.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key, error = %e, "Failed to serialize cache value");
                return;
            }
        };

        self.local.set(key, raw.clone(), ttl).await;

        if let Some(primary) = &self.primary {
            if self.health.allow_attempt(self.cooldown) {
                match primary.set(key, &raw, ttl).await {
                    Ok(()) => self.health.mark_up(),
                    Err(e) => {
                        tracing::warn!(key, error = %e, "Primary cache write failed, demoting");
                        self.health.mark_down();
                    }
                }
            }
        }
    }

    /// Remove a key from both tiers.
    pub async fn remove(&self, key: &str) {
        self.local.remove(key).await;

        if let Some(primary) = &self.primary {
            if self.health.allow_attempt(self.cooldown) {
                if let Err(e) = primary.remove(key).await {
                    tracing::warn!(key, error = %e, "Primary cache remove failed, demoting");
                    self.health.mark_down();
                }
            }
        }
    }

    /// Actively probe the primary backend and update the health state.
    ///
    /// Returns `true` when the backend answered.
    pub async fn probe_backend(&self) -> bool {
        let Some(primary) = &self.primary else {
            return false;
        };
        match primary.ping().await {
            Ok(()) => {
                self.health.mark_up();
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache backend probe failed");
                self.health.mark_down();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::backend::CacheError;

    /// Backend fake that counts calls and can be switched to failing.
    struct FakeBackend {
        store: Mutex<std::collections::HashMap<String, String>>,
        failing: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                store: Mutex::new(std::collections::HashMap::new()),
                failing: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail_if_down(&self) -> Result<(), CacheError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                // Any serde error stands in for an I/O failure here.
                Err(serde_json::from_str::<i32>("").unwrap_err().into())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CacheBackend for FakeBackend {
        async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
            self.fail_if_down()?;
            Ok(self.store.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
            self.fail_if_down()?;
            self.store
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<(), CacheError> {
            self.fail_if_down()?;
            self.store.lock().unwrap().remove(key);
            Ok(())
        }

        async fn ping(&self) -> Result<(), CacheError> {
            self.fail_if_down()
        }
    }

    #[tokio::test]
    async fn local_only_round_trip() {
        let cache = HybridCache::local_only();
        cache.set("k", &42u32, Duration::from_secs(60)).await;
        assert_eq!(cache.get::<u32>("k").await, Some(42));
        cache.remove("k").await;
        assert_eq!(cache.get::<u32>("k").await, None);
    }

    #[tokio::test]
    async fn writes_reach_both_tiers() {
        let backend = FakeBackend::new();
        let cache = HybridCache::new(
            Some(backend.clone()),
            BackendHealth::new(),
            DEFAULT_COOLDOWN,
        );

        cache.set("k", &"v".to_string(), Duration::from_secs(60)).await;
        assert!(backend.store.lock().unwrap().contains_key("k"));
        assert_eq!(cache.get::<String>("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn failing_primary_degrades_to_local() {
        let backend = FakeBackend::new();
        backend.set_failing(true);
        let cache = HybridCache::new(
            Some(backend.clone()),
            BackendHealth::new(),
            DEFAULT_COOLDOWN,
        );

        // Set fails against the primary but still lands locally.
        cache.set("k", &7i64, Duration::from_secs(60)).await;
        assert!(!cache.backend_reachable());
        assert_eq!(cache.get::<i64>("k").await, Some(7));
    }

    #[tokio::test]
    async fn demotion_stops_hammering_the_backend() {
        let backend = FakeBackend::new();
        backend.set_failing(true);
        // Long cool-down so no re-probe happens during the test.
        let cache = HybridCache::new(
            Some(backend.clone()),
            BackendHealth::new(),
            Duration::from_secs(3600),
        );

        cache.set("a", &1u8, Duration::from_secs(60)).await;
        let after_first_failure = backend.call_count();

        cache.set("b", &2u8, Duration::from_secs(60)).await;
        let _ = cache.get::<u8>("a").await;
        assert_eq!(backend.call_count(), after_first_failure);
    }

    #[tokio::test]
    async fn probe_recovers_the_backend() {
        let backend = FakeBackend::new();
        backend.set_failing(true);
        let cache = HybridCache::new(
            Some(backend.clone()),
            BackendHealth::new(),
            Duration::from_secs(3600),
        );

        assert!(!cache.probe_backend().await);
        backend.set_failing(false);
        assert!(cache.probe_backend().await);
        assert!(cache.backend_reachable());

        // Primary is consulted again after promotion.
        let before = backend.call_count();
        cache.set("k", &1u8, Duration::from_secs(60)).await;
        assert!(backend.call_count() > before);
    }
}
