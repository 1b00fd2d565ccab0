// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Session authentication layer for the `gatehouse` web application:
//! accounts, server-side sessions and the request pipeline that guards them.

pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use crate::auth::{AuthService, CredentialHasher, DefaultAuth, SessionManager};
use crate::config::{Settings, StorageBackend};
use crate::middleware::RateLimiter;
use crate::storage::{FlatFileStore, MemoryStore, SessionStore, UserStore};
use std::sync::Arc;

pub use router::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Account service
    pub auth: Arc<dyn AuthService>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
    /// Rate limiter
    pub rate_limiter: Arc<RateLimiter>,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create the application state with the store the settings select
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        match settings.storage.backend {
            StorageBackend::Memory => {
                let store = Arc::new(MemoryStore::new());
                Self::with_stores(settings, store.clone(), store)
            },
            StorageBackend::FlatFile => {
                let store = Arc::new(FlatFileStore::new(&settings.storage.path)?);
                Self::with_stores(settings, store.clone(), store)
            },
        }
    }

    /// Create the application state over explicit stores
    pub fn with_stores(
        settings: Settings,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
    ) -> anyhow::Result<Self> {
        let store_timeout = settings.session.store_timeout();
        let hasher = CredentialHasher::with_log_n(settings.password.log_n)?;

        let sessions = Arc::new(SessionManager::new_with_timeouts(
            sessions,
            settings.session.ttl(),
            store_timeout,
        ));
        let auth = Arc::new(DefaultAuth::new(users, hasher, store_timeout));
        let rate_limiter = Arc::new(RateLimiter::new(
            settings.rate_limit.window(),
            settings.rate_limit.max_requests,
        ));

        Ok(Self {
            auth,
            sessions,
            rate_limiter,
            settings: Arc::new(settings),
        })
    }
}
