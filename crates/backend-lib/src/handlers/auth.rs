// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration, login and logout.
use crate::auth::{generate_secure_token, AuthError};
use crate::cookies::{clear_csrf_cookie, clear_session_cookie, csrf_cookie, session_cookie};
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILED, USER_REGISTERED};
use crate::middleware::{ClientIp, CurrentUser};
use crate::validation::{login_email, validate_registration};
use crate::AppState;
use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap},
    response::Redirect,
    Form,
};
use axum_extra::extract::CookieJar;
use gatehouse_common::{LoginForm, RegisterForm, UserId, APP_PATH, LOGIN_PATH};
use metrics::counter;
use std::net::IpAddr;
use tracing::info;

/// `POST /register`
pub async fn register(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let registration = validate_registration(&form).inspect_err(|e| {
        info!(error = %e, "registration rejected");
    })?;

    let user = match state
        .auth
        .register(&registration.email, registration.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::EmailAlreadyExists) => {
            info!("registration rejected: email already exists");
            return Err(AppError::EmailAlreadyExists);
        },
        Err(e) => return Err(e.into()),
    };
    counter!(USER_REGISTERED).increment(1);

    start_session(&state, jar, user.id, client_ip, user_agent(&headers)).await
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let email = login_email(&form);
    let user = match state.auth.authenticate(&email, &form.password).await {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            counter!(LOGIN_FAILED).increment(1);
            info!(client_ip = ?client_ip, "login failed");
            return Err(AppError::InvalidCredentials);
        },
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, "user logged in");
    start_session(&state, jar, user.id, client_ip, user_agent(&headers)).await
}

/// `POST /app/logout`
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    state.sessions.revoke_session(&current.session.token).await?;
    info!(user_id = %current.user.id, "user logged out");

    let jar = jar.add(clear_session_cookie()).add(clear_csrf_cookie());
    Ok((jar, Redirect::to(LOGIN_PATH)))
}

/// Issue the session (replacing any earlier one) and a fresh CSRF token
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user_id: UserId,
    client_ip: Option<IpAddr>,
    user_agent: &str,
) -> Result<(CookieJar, Redirect), AppError> {
    let token = state
        .sessions
        .create_session(user_id, client_ip, user_agent)
        .await?;
    let csrf = generate_secure_token()?;
    let ttl = state.sessions.ttl();

    let jar = jar
        .add(session_cookie(token, ttl))
        .add(csrf_cookie(csrf, ttl));
    Ok((jar, Redirect::to(APP_PATH)))
}

fn user_agent(headers: &HeaderMap) -> &str {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
