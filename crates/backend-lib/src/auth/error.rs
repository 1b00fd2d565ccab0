//! Authentication and session errors.
use crate::storage::StoreError;
use thiserror::Error;

/// Errors produced by the session manager, the credential hasher and the
/// account service
#[derive(Error, Debug)]
pub enum AuthError {
    /// No session exists for the token
    #[error("Invalid session")]
    InvalidSession,

    /// The session exists but its expiry has passed; the row has been removed
    #[error("Session has expired")]
    SessionExpired,

    /// The OS random source failed. Never retried with a weaker source.
    #[error("Secure random source unavailable: {0}")]
    RandomSource(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// A store call did not finish within the configured timeout
    #[error("Store operation timed out")]
    StoreTimeout,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Whether the error means the request is simply not authenticated
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AuthError::InvalidSession | AuthError::SessionExpired)
    }
}
