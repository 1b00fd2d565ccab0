// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.
mod error;
pub mod password;
mod service;
mod service_impl;
pub mod session;
pub mod token_generator;

pub use error::AuthError;
pub use password::{CredentialHasher, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use session::{SessionManager, DEFAULT_STORE_TIMEOUT, SESSION_TTL};
pub use token_generator::generate_secure_token;
