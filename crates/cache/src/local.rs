//! In-process fallback tier.

use std::time::{Duration, Instant};

use moka::future::Cache;

/// Maximum entries held by the local tier before LRU eviction.
const LOCAL_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache of JSON strings with per-entry TTLs.
///
/// Expiry is checked on read; moka handles capacity-based eviction.
pub struct LocalCache {
    cache: Cache<String, Entry>,
}

impl LocalCache {
    pub fn new() -> Self {
        let cache = Cache::builder().max_capacity(LOCAL_CAPACITY).build();
        Self { cache }
    }

    /// Fetch a value, treating expired entries as misses.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value),
            Some(_) => {
                self.cache.invalidate(key).await;
                None
            }
            None => None,
        }
    }

    pub async fn set(&self, key: &str, value: String, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
    }

    pub async fn remove(&self, key: &str) {
        self.cache.invalidate(key).await;
    }
}

impl Default for LocalCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get() {
        let cache = LocalCache::new();
        cache
            .set("k", "\"v\"".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("k").await.as_deref(), Some("\"v\""));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = LocalCache::new();
        cache
            .set("k", "\"v\"".to_string(), Duration::from_millis(10))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn remove_drops_the_entry() {
        let cache = LocalCache::new();
        cache
            .set("k", "\"v\"".to_string(), Duration::from_secs(60))
            .await;
        cache.remove("k").await;
        assert!(cache.get("k").await.is_none());
    }
}
