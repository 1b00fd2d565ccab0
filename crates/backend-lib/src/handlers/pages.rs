//! Page placeholders. Rendering is left to the embedding application.
use crate::middleware::CurrentUser;

pub async fn home() -> &'static str {
    "home"
}

pub async fn login_page() -> &'static str {
    "login"
}

pub async fn register_page() -> &'static str {
    "register"
}

pub async fn app_index(_current: CurrentUser) -> &'static str {
    "app"
}

pub async fn dashboard(_current: CurrentUser) -> &'static str {
    "dashboard"
}

/// The signed-in user's email
pub async fn account(current: CurrentUser) -> String {
    current.user.email
}
