// crates/backend-lib/src/middleware/mod.rs

//! Request pipeline middleware.

pub mod auth_gate;
pub mod chain;
pub mod client_ip;
pub mod csrf;
pub mod logging;
pub mod rate_limit;
pub mod security_headers;
pub mod session_refresh;

pub use auth_gate::{require_auth, CurrentUser};
pub use client_ip::{client_ip, ClientIp};
pub use csrf::csrf_guard;
pub use logging::log_requests;
pub use rate_limit::{rate_limit, RateLimiter};
pub use security_headers::security_headers;
pub use session_refresh::refresh_session;
