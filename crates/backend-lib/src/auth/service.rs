// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait, which is used for account
//! registration, credential checks and user resolution
use super::AuthError;
use async_trait::async_trait;
use gatehouse_common::{User, UserId};

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a password account. `email` must already be normalized and
    /// `password` already length-checked.
    async fn register(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Check an email/password pair, returning the matching user
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// Resolve a user by ID; `None` if the user no longer exists
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, AuthError>;
}
