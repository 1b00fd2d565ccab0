// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Storage abstraction for users and sessions.
//!
//! Stores are a pure persistence boundary: they enforce the uniqueness
//! constraints of the schema (one email per user, one session per user)
//! and nothing else. Expiry and revocation policy lives in
//! [`crate::auth::SessionManager`].

mod flat_file;
mod memory;
mod tables;

pub use flat_file::FlatFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_common::{NewUser, Session, User, UserId};
use thiserror::Error;

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Internal(String),
}

/// Persistence contract for session records
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert `session`, replacing any session already held by the same user,
    /// as a single atomic operation. Returns the stored token.
    async fn upsert_session(&self, session: Session) -> Result<String, StoreError>;

    /// Fetch a session by its token
    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Delete a session by its token. Deleting a missing session is not an error.
    async fn delete_session_by_token(&self, token: &str) -> Result<(), StoreError>;

    /// Move the expiry of the session identified by `token`
    async fn update_session_expiry(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Delete every session owned by `user_id`
    async fn delete_sessions_by_user(&self, user_id: UserId) -> Result<(), StoreError>;
}

/// Persistence contract for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with [`StoreError::EmailTaken`] if the email is in use.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Fetch a user by ID
    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Fetch a user by normalized email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Delete a user. Sessions owned by the user are left in place.
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;
}
