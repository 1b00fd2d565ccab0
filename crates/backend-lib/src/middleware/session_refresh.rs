//! Sliding session expiry.
use crate::{cookies::session_cookie, AppState};
use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use gatehouse_common::SESSION_COOKIE;
use tracing::{debug, warn};

/// Extend the session behind the cookie and re-issue the cookie with a
/// fresh max-age. Refresh failures never fail the request.
pub async fn refresh_session(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let Some(token) = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|token| !token.is_empty())
    else {
        return next.run(request).await;
    };

    let refreshed = match state.sessions.refresh_session(&token).await {
        Ok(()) => true,
        Err(e) if e.is_unauthenticated() => {
            debug!(error = %e, "session not refreshed");
            false
        },
        Err(e) => {
            warn!(error = %e, "session refresh failed");
            false
        },
    };

    let mut response = next.run(request).await;
    // A handler that set or cleared the session cookie itself has the last word
    if refreshed && !sets_session_cookie(&response) {
        let cookie = session_cookie(token, state.sessions.ttl());
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            },
            Err(e) => warn!(error = %e, "could not encode session cookie"),
        }
    }
    response
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| value.as_bytes().starts_with(prefix.as_bytes()))
}
