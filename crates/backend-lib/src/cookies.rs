// ============================
// crates/backend-lib/src/cookies.rs
// ============================
//! Session and CSRF cookie builders.
use axum_extra::extract::cookie::{Cookie, SameSite};
use gatehouse_common::{CSRF_TOKEN, SESSION_COOKIE};
use time::Duration;

/// Create the session cookie. Scripts cannot read it.
pub fn session_cookie(token: impl Into<String>, ttl: std::time::Duration) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.into()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(max_age(ttl))
        .build()
}

/// Create the removal cookie for the session
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(-1))
        .build()
}

/// Create the CSRF cookie. Readable from page scripts so they can echo it
/// back in the `X-CSRF-Token` header.
pub fn csrf_cookie(token: impl Into<String>, ttl: std::time::Duration) -> Cookie<'static> {
    Cookie::build((CSRF_TOKEN, token.into()))
        .http_only(false)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(max_age(ttl))
        .build()
}

/// Create the removal cookie for the CSRF token
pub fn clear_csrf_cookie() -> Cookie<'static> {
    Cookie::build((CSRF_TOKEN, ""))
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(Duration::seconds(-1))
        .build()
}

fn max_age(ttl: std::time::Duration) -> Duration {
    Duration::try_from(ttl).unwrap_or(Duration::MAX)
}
