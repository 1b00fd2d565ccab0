// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use crate::auth::AuthError;
use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use gatehouse_common::LOGIN_PATH;
use thiserror::Error;
use tracing::error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Not a failure page: the client is sent to the login form
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("CSRF check failed: {0}")]
    CsrfRejected(&'static str),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Could not determine client IP")]
    UnknownClientIp,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unprocessable input: {0}")]
    Unprocessable(#[from] ValidationError),

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            AppError::CsrfRejected(_) => StatusCode::FORBIDDEN,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::UnknownClientIp | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::CsrfRejected(_) => "CSRF_001",
            AppError::RateLimitExceeded => "RATE_001",
            AppError::UnknownClientIp => "RATE_002",
            AppError::BadRequest(_) => "REQ_001",
            AppError::Unprocessable(_) => "VAL_001",
            AppError::EmailAlreadyExists => "USER_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for clients
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Unauthenticated => "Authentication required".to_string(),
            AppError::InvalidCredentials => "Authentication failed".to_string(),
            AppError::CsrfRejected(_) => "Invalid CSRF token".to_string(),
            AppError::RateLimitExceeded => {
                "Rate limit exceeded, please try again later".to_string()
            },
            AppError::UnknownClientIp => "Could not determine client IP".to_string(),
            AppError::BadRequest(_) => "Invalid request format".to_string(),
            AppError::Unprocessable(_) => "Invalid input provided".to_string(),
            AppError::EmailAlreadyExists => "Email already exists".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidSession | AuthError::SessionExpired => AppError::Unauthenticated,
            AuthError::EmailAlreadyExists => AppError::EmailAlreadyExists,
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Unauthenticated = self {
            return Redirect::to(LOGIN_PATH).into_response();
        }

        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, code = self.error_code(), "request failed");
        }

        // Detail stays in the logs; clients only see the sanitized message
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.sanitized_message(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
