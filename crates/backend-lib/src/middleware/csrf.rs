//! Double-submit cookie CSRF protection.
use crate::{error::AppError, metrics::CSRF_REJECTED};
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use gatehouse_common::{CSRF_HEADER, CSRF_TOKEN};
use metrics::counter;
use tracing::warn;
use url::form_urlencoded;

/// Largest form body buffered while looking for the token
pub const MAX_FORM_BYTES: usize = 64 * 1024;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Require the `csrf_token` cookie to match the submitted token on every
/// state-changing request. Safe methods pass through untouched.
pub async fn csrf_guard(jar: CookieJar, request: Request, next: Next) -> Result<Response, AppError> {
    if request.method().is_safe() {
        return Ok(next.run(request).await);
    }

    let Some(expected) = jar
        .get(CSRF_TOKEN)
        .map(|c| c.value().to_owned())
        .filter(|token| !token.is_empty())
    else {
        return Err(reject("missing cookie"));
    };

    let (request, submitted) = submitted_token(request).await?;
    match submitted {
        Some(token) if tokens_match(&expected, &token) => Ok(next.run(request).await),
        Some(_) => Err(reject("token mismatch")),
        None => Err(reject("missing token")),
    }
}

/// Token from the form body, else from the header. A buffered body is put
/// back so the handler still sees it.
async fn submitted_token(request: Request) -> Result<(Request, Option<String>), AppError> {
    let from_header = header_token(request.headers());
    if !is_form(request.headers()) {
        return Ok((request, from_header));
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable form body: {e}")))?;

    let from_form = form_urlencoded::parse(&bytes)
        .find(|(key, _)| key == CSRF_TOKEN)
        .map(|(_, value)| value.into_owned());

    Ok((
        Request::from_parts(parts, Body::from(bytes)),
        from_form.or(from_header),
    ))
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE))
}

/// Exact comparison whose running time does not depend on where the
/// inputs differ
fn tokens_match(expected: &str, submitted: &str) -> bool {
    let (a, b) = (expected.as_bytes(), submitted.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn reject(reason: &'static str) -> AppError {
    counter!(CSRF_REJECTED).increment(1);
    warn!(reason, "csrf check failed");
    AppError::CsrfRejected(reason)
}
