//! Middleware ordering.
//!
//! Stacks are built with `ServiceBuilder`, so the first layer listed is
//! the outermost: it sees the request first and the response last.
use super::{
    auth_gate::require_auth, csrf::csrf_guard, logging::log_requests, rate_limit::rate_limit,
    security_headers::security_headers, session_refresh::refresh_session,
};
use crate::AppState;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower::ServiceBuilder;

/// Auth gate, then CSRF guard, then session refresh
pub fn protected(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes.layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(state.clone(), require_auth))
            .layer(from_fn(csrf_guard))
            .layer(from_fn_with_state(state.clone(), refresh_session)),
    )
}

/// Logging, then rate limiting, then security headers, around the whole route tree.
/// Rate limiting rejects before any session or store work happens.
pub fn application(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes.layer(
        ServiceBuilder::new()
            .layer(from_fn(log_requests))
            .layer(from_fn_with_state(state.clone(), rate_limit))
            .layer(from_fn(security_headers)),
    )
}
