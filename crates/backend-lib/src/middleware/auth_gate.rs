//! Session authentication for protected routes.
use crate::{cookies::clear_session_cookie, error::AppError, metrics::AUTH_REDIRECTED, AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use gatehouse_common::{Session, User, SESSION_COOKIE};
use metrics::counter;
use tracing::{debug, warn};

/// The authenticated user, attached to the request by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: Session,
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

/// Resolve the session cookie to a user or send the client to the login page.
/// Store failures are 500s, not redirects.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) else {
        counter!(AUTH_REDIRECTED).increment(1);
        return AppError::Unauthenticated.into_response();
    };

    let session = match state.sessions.validate_session(&token).await {
        Ok(session) => session,
        Err(e) if e.is_unauthenticated() => {
            debug!(error = %e, "rejecting session cookie");
            return redirect_to_login(jar);
        },
        Err(e) => return AppError::from(e).into_response(),
    };

    let user = match state.auth.user_by_id(session.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!(user_id = %session.user_id, "session owner no longer exists");
            if let Err(e) = state.sessions.revoke_session(&token).await {
                return AppError::from(e).into_response();
            }
            return redirect_to_login(jar);
        },
        Err(e) => return AppError::from(e).into_response(),
    };

    request
        .extensions_mut()
        .insert(CurrentUser { user, session });
    next.run(request).await
}

fn redirect_to_login(jar: CookieJar) -> Response {
    counter!(AUTH_REDIRECTED).increment(1);
    (jar.add(clear_session_cookie()), AppError::Unauthenticated).into_response()
}
