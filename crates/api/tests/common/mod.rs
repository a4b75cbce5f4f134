//! Shared fixtures for integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mqguard_api::auth::password::hash_password;
use mqguard_api::engine::{AuthDecisionEngine, CredentialStore};
use mqguard_cache::HybridCache;
use mqguard_db::models::user::MqttUser;
use mqguard_events::EventBus;

/// In-memory credential store with call counters.
///
/// The lookup counter is what the caching assertions hang off: a cache
/// hit must mean zero additional lookups.
pub struct FakeCredentialStore {
    users: Mutex<HashMap<String, MqttUser>>,
    pub find_calls: AtomicUsize,
    pub login_calls: AtomicUsize,
}

impl FakeCredentialStore {
    pub fn new(users: Vec<MqttUser>) -> Arc<Self> {
        let map = users
            .into_iter()
            .map(|u| (u.username.clone(), u))
            .collect();
        Arc::new(Self {
            users: Mutex::new(map),
            find_calls: AtomicUsize::new(0),
            login_calls: AtomicUsize::new(0),
        })
    }

    pub fn find_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for FakeCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<MqttUser>, sqlx::Error> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().get(username).cloned())
    }

    async fn record_login(&self, _username: &str) -> Result<(), sqlx::Error> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A user row with an Argon2 hash of `password` and permissive defaults.
pub fn make_user(username: &str, password: &str) -> MqttUser {
    let now = chrono::Utc::now();
    MqttUser {
        id: 1,
        username: username.to_string(),
        password_hash: hash_password(password).unwrap(),
        client_id: None,
        is_superuser: false,
        is_active: true,
        publish_acl: String::new(),
        subscribe_acl: String::new(),
        cache_version: 0,
        login_count: 0,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Engine over the fake store, a local-only cache, and a fresh bus.
pub fn make_engine(
    store: Arc<FakeCredentialStore>,
) -> (AuthDecisionEngine, Arc<EventBus>) {
    let bus = Arc::new(EventBus::default());
    let engine = AuthDecisionEngine::new(
        store,
        Arc::new(HybridCache::local_only()),
        Arc::clone(&bus),
        Duration::from_secs(300),
        "admin/".to_string(),
    );
    (engine, bus)
}
