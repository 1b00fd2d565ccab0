// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Form input validation.

use crate::auth::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use gatehouse_common::{LoginForm, RegisterForm};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Possible validation errors.
///
/// The messages are for logs; responses never carry them.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Password confirmation does not match")]
    PasswordMismatch,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A registration that passed validation
#[derive(Debug)]
pub struct ValidRegistration<'a> {
    /// Normalized email
    pub email: String,
    pub password: &'a str,
}

/// Trim and lower-case an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a normalized email
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email must not be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Email format is invalid".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a password's length in bytes (not characters)
pub fn validate_password_length(password: &str) -> ValidationResult<&str> {
    let len = password.len();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(password)
}

/// Validate a registration form
pub fn validate_registration(form: &RegisterForm) -> ValidationResult<ValidRegistration<'_>> {
    if form.password != form.repeat {
        return Err(ValidationError::PasswordMismatch);
    }

    let email = normalize_email(&form.email);
    validate_email(&email)?;
    validate_password_length(&form.password)?;

    Ok(ValidRegistration {
        email,
        password: &form.password,
    })
}

/// Normalize a login form's email. Login does not apply the registration
/// rules; a malformed email simply matches no account.
pub fn login_email(form: &LoginForm) -> String {
    normalize_email(&form.email)
}
