//! End-to-end tests through the full router and middleware stack.
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use gatehouse_backend::{
    config::{Settings, StorageBackend},
    create_router, AppState,
};
use std::{net::SocketAddr, time::Duration};
use tempfile::TempDir;
use tower::ServiceExt;

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.password.log_n = 4;
    settings
}

fn app_with(settings: Settings) -> Router {
    let state = AppState::new(settings).unwrap();
    create_router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40_000))))
}

fn app() -> Router {
    app_with(test_settings())
}

fn form(uri: &str, cookies: &str, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if !cookies.is_empty() {
        builder = builder.header(COOKIE, cookies);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookies: &str) -> Request<Body> {
    let mut builder = Request::get(uri);
    if !cookies.is_empty() {
        builder = builder.header(COOKIE, cookies);
    }
    builder.body(Body::empty()).unwrap()
}

fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Register and return `(session, csrf)` tokens
async fn register(app: &Router, email: &str, password: &str) -> (String, String) {
    let body = format!("email={email}&password={password}&repeat={password}");
    let response = app
        .clone()
        .oneshot(form("/register", "", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/app");
    (
        cookie_value(&response, "session").unwrap(),
        cookie_value(&response, "csrf_token").unwrap(),
    )
}

#[tokio::test]
async fn test_register_then_access_protected_page() {
    let app = app();
    let (session, csrf) = register(&app, "New.User%40Example.com", "password10").await;
    assert_eq!(session.len(), 43);
    assert_eq!(csrf.len(), 43);

    let response = app
        .clone()
        .oneshot(get("/app/account", &format!("session={session}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "new.user@example.com");

    for page in ["/app", "/app/dashboard"] {
        let response = app
            .clone()
            .oneshot(get(page, &format!("session={session}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{page}");
    }
}

#[tokio::test]
async fn test_public_pages_need_no_session() {
    let app = app();
    for page in ["/", "/home", "/login", "/register"] {
        let response = app.clone().oneshot(get(page, "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{page}");
    }
}

#[tokio::test]
async fn test_duplicate_email_conflicts_without_session() {
    let app = app();
    register(&app, "user%40example.com", "password10").await;

    let response = app
        .oneshot(form(
            "/register",
            "",
            "email=USER%40example.com&password=different1&repeat=different1",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(cookie_value(&response, "session").is_none());
}

#[tokio::test]
async fn test_invalid_registration_is_unprocessable() {
    let app = app();
    let cases = [
        "email=user%40example.com&password=password10&repeat=password11",
        "email=user%40example.com&password=short&repeat=short",
        "email=not-an-email&password=password10&repeat=password10",
        "email=&password=password10&repeat=password10",
    ];
    for body in cases {
        let response = app
            .clone()
            .oneshot(form("/register", "", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        let text = body_string(response).await;
        assert!(!text.contains("password"), "{text}");
    }
}

#[tokio::test]
async fn test_protected_page_redirects_without_session() {
    let app = app();
    let response = app.oneshot(get("/app/dashboard", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");
}

#[tokio::test]
async fn test_login_supersedes_previous_session() {
    let app = app();
    let (first, _) = register(&app, "user%40example.com", "password10").await;

    let response = app
        .clone()
        .oneshot(form(
            "/login",
            "",
            "email=user%40example.com&password=password10",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/app");
    let second = cookie_value(&response, "session").unwrap();
    assert_ne!(first, second);

    let response = app
        .clone()
        .oneshot(get("/app", &format!("session={first}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .oneshot(get("/app", &format!("session={second}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_are_generic() {
    let app = app();
    register(&app, "user%40example.com", "password10").await;

    let wrong_password = app
        .clone()
        .oneshot(form(
            "/login",
            "",
            "email=user%40example.com&password=password11",
        ))
        .await
        .unwrap();
    let unknown_user = app
        .oneshot(form(
            "/login",
            "",
            "email=nobody%40example.com&password=password10",
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_string(wrong_password).await,
        body_string(unknown_user).await
    );
}

#[tokio::test]
async fn test_logout_revokes_session_and_clears_cookies() {
    let app = app();
    let (session, csrf) = register(&app, "user%40example.com", "password10").await;
    let cookies = format!("session={session}; csrf_token={csrf}");

    let response = app
        .clone()
        .oneshot(form("/app/logout", &cookies, &format!("csrf_token={csrf}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");
    assert_eq!(cookie_value(&response, "session").as_deref(), Some(""));
    assert_eq!(cookie_value(&response, "csrf_token").as_deref(), Some(""));

    let response = app
        .oneshot(get("/app", &format!("session={session}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_without_csrf_token_is_forbidden() {
    let app = app();
    let (session, csrf) = register(&app, "user%40example.com", "password10").await;
    let cookies = format!("session={session}; csrf_token={csrf}");

    let response = app
        .clone()
        .oneshot(form("/app/logout", &cookies, "csrf_token=forged"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["x-frame-options"], "DENY");
    assert_eq!(response.headers()["content-security-policy"], "default-src 'self'");

    // The session survives a rejected logout
    let response = app
        .oneshot(get("/app", &format!("session={session}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_runs_before_csrf() {
    let app = app();
    let response = app
        .oneshot(form("/app/logout", "", "csrf_token=anything"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");
}

#[tokio::test]
async fn test_protected_responses_refresh_session_cookie() {
    let app = app();
    let (session, _) = register(&app, "user%40example.com", "password10").await;

    let response = app
        .oneshot(get("/app/dashboard", &format!("session={session}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cookie_value(&response, "session"), Some(session));
}

#[tokio::test]
async fn test_request_id_and_security_headers_on_every_response() {
    let app = app();
    let response = app.oneshot(get("/home", "")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["pragma"], "no-cache");
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_window() {
    let app = app();

    for _ in 0..100 {
        let response = app.clone().oneshot(get("/home", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.clone().oneshot(get("/home", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::advance(Duration::from_secs(61)).await;
    let response = app.oneshot(get("/home", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_for_gets_its_own_allowance() {
    let mut settings = test_settings();
    settings.rate_limit.max_requests = 2;
    let app = app_with(settings);

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.clone().oneshot(get("/", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .oneshot(
            Request::get("/")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_flat_file_accounts_survive_restart() {
    let dir = TempDir::new().unwrap();
    let mut settings = test_settings();
    settings.storage.backend = StorageBackend::FlatFile;
    settings.storage.path = dir.path().to_path_buf();

    let app = app_with(settings.clone());
    let (session, _) = register(&app, "user%40example.com", "password10").await;
    drop(app);

    let app = app_with(settings);
    let response = app
        .clone()
        .oneshot(get("/app/account", &format!("session={session}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(form(
            "/login",
            "",
            "email=user%40example.com&password=password10",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
