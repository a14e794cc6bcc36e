use serde::{Deserialize, Serialize};

use super::user::{UserResponse, validate_email, validate_password, validate_username};
use crate::error::AppError;

/// Self-service registration. Accounts created here are never administrators.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "Str0ng!Pass")]
    pub password: String,
    #[schema(example = "Str0ng!Pass")]
    pub password_confirm: String,
}

pub fn validate_register(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_password(&payload.password, Some(&payload.password_confirm))
}

/// Request body for login. Supply either `email` or `username`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    #[schema(example = "alice")]
    pub username: Option<String>,
    #[schema(example = "Str0ng!Pass")]
    pub password: String,
}

/// How the login request identifies the account.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginIdentity {
    Email(String),
    Username(String),
}

/// Validate the login body and pick the identity to look up.
pub fn login_identity(payload: &LoginRequest) -> Result<LoginIdentity, AppError> {
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    let pick = |v: &Option<String>| {
        v.as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    };
    if let Some(email) = pick(&payload.email) {
        return Ok(LoginIdentity::Email(email));
    }
    if let Some(username) = pick(&payload.username) {
        return Ok(LoginIdentity::Username(username));
    }
    Err(AppError::Validation(
        "Either email or username is required".into(),
    ))
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    #[schema(example = 1800)]
    pub expires_in: i64,
    pub user: UserResponse,
}
