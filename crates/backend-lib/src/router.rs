// ============================
// crates/backend-lib/src/router.rs
// ============================
//! Route tree.
use crate::{
    handlers::{auth, pages},
    middleware::chain,
    AppState,
};
use axum::{
    routing::{get, post},
    Router,
};
use gatehouse_common::APP_PATH;

/// Create the application router: public pages and forms at the root,
/// session-protected pages under `/app`.
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/", get(pages::app_index))
        .route("/dashboard", get(pages::dashboard))
        .route("/account", get(pages::account))
        .route("/logout", post(auth::logout));

    let routes = Router::new()
        .route("/", get(pages::home))
        .route("/home", get(pages::home))
        .route("/login", get(pages::login_page).post(auth::login))
        .route("/register", get(pages::register_page).post(auth::register))
        .nest(APP_PATH, chain::protected(protected, &state));

    chain::application(routes, &state).with_state(state)
}
