// ================
// crates/common/src/lib.rs
// ================
//! Common types and structures
//! shared between the `gatehouse` session layer, its stores and its HTTP surface.
//! This module defines the persisted records and the form payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// User identifier type
pub type UserId = Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session";

/// Name of both the CSRF cookie and the matching form field
pub const CSRF_TOKEN: &str = "csrf_token";

/// Header accepted in place of the CSRF form field for non-form clients
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Where unauthenticated requests are sent
pub const LOGIN_PATH: &str = "/login";

/// Landing page after a successful login or registration
pub const APP_PATH: &str = "/app";

/// An identity record
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID
    pub id: UserId,
    /// Unique, lower-cased email
    pub email: String,
    /// PHC-formatted password hash, absent for externally authenticated users
    pub password_hash: Option<String>,
    /// Subject of a federated identity, if any
    pub external_id: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Data needed to insert a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Already normalized email
    pub email: String,
    /// Already hashed password
    pub password_hash: Option<String>,
    /// Federated identity subject
    pub external_id: Option<String>,
}

/// A server-side session record.
///
/// At most one exists per user: storing a new one for the same `user_id`
/// replaces the previous token, expiry and client metadata.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Row identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: UserId,
    /// Opaque token mirrored in the `session` cookie
    pub token: String,
    /// When the session was issued
    pub created_at: DateTime<Utc>,
    /// Expiry; `None` never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Client address at issuance, audit only
    pub ip_address: Option<IpAddr>,
    /// Client user agent at issuance, audit only
    pub user_agent: String,
}

impl Session {
    /// Whether the session's expiry has passed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

/// Registration form payload
///
/// Every field defaults to empty so that malformed submissions reach
/// validation instead of failing deserialization with field detail.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Password confirmation
    #[serde(default)]
    pub repeat: String,
}

/// Login form payload
#[derive(Deserialize, Debug, Clone, Default)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}
