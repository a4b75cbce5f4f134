//! Two-tier read-through/write-through cache.
//!
//! - Primary tier: a shared network backend (Redis), reached through the
//!   [`CacheBackend`] trait.
//! - Local tier: an in-process moka cache.
//!
//! Writes always land in the local tier first, then best-effort in the
//! primary. Reads consult the primary only while it is believed
//! reachable; any primary error demotes the cache to local-only for a
//! cool-down interval. A primary failure never reaches the caller; the
//! worst case is an uncached (slower but correct) decision upstream.

pub mod backend;
pub mod hybrid;
pub mod local;

pub use backend::{CacheBackend, CacheError, RedisBackend};
pub use hybrid::{BackendHealth, HybridCache};
pub use local::LocalCache;
