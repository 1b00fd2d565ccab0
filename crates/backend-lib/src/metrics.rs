// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const SESSION_REFRESHED: &str = "session.refreshed";
pub const SESSION_REVOKED: &str = "session.revoked";
pub const AUTH_REDIRECTED: &str = "auth.redirected";
pub const CSRF_REJECTED: &str = "csrf.rejected";
pub const RATE_LIMITED: &str = "rate_limit.rejected";
pub const RATE_LIMIT_BUCKETS: &str = "rate_limit.buckets";
pub const USER_REGISTERED: &str = "user.registered";
pub const LOGIN_FAILED: &str = "login.failed";
