use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::entity::user;
use crate::error::AppError;

const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Public view of a user. Never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "alice")]
    pub username: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            username: m.username,
            is_active: m.is_active,
            is_superuser: m.is_superuser,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Request body for creating a user (admin) or registering.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// 3-50 characters: letters, digits, `_` or `-`.
    #[schema(example = "alice")]
    pub username: String,
    /// 8-100 characters with upper, lower, digit and special character.
    #[schema(example = "Str0ng!Pass")]
    pub password: String,
    #[schema(example = "Str0ng!Pass")]
    pub password_confirm: String,
    /// Ignored on self-registration. Default: true.
    pub is_active: Option<bool>,
    /// Ignored on self-registration. Default: false.
    pub is_superuser: Option<bool>,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Required when `password` is given.
    pub password_confirm: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Rows to skip. Default: 0.
    pub skip: Option<u64>,
    /// Rows per page, 1-1000. Default: 100.
    pub limit: Option<u64>,
    /// Case-insensitive match on username or email.
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

pub fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let invalid = || AppError::Validation("Invalid email address".into());
    let email = email.trim();
    if email.chars().count() > 255 {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());
    if local_ok && host_ok && tld_ok {
        Ok(())
    } else {
        Err(invalid())
    }
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    let username = username.trim();
    let len = username.chars().count();
    if !(3..=50).contains(&len) {
        return Err(AppError::Validation(
            "Username must be 3-50 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, underscores and hyphens".into(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str, confirm: Option<&str>) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(8..=100).contains(&len) {
        return Err(AppError::Validation(
            "Password must be 8-100 characters".into(),
        ));
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !(has_upper && has_lower && has_digit && has_special) {
        return Err(AppError::Validation(
            "Password must contain an uppercase letter, a lowercase letter, a digit and a special character".into(),
        ));
    }
    if confirm != Some(password) {
        return Err(AppError::bad_request(
            "PASSWORD_MISMATCH",
            "Passwords do not match",
        ));
    }
    Ok(())
}

pub fn validate_create_user(payload: &CreateUserRequest) -> Result<(), AppError> {
    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_password(&payload.password, Some(&payload.password_confirm))
}

pub fn validate_update_user(payload: &UpdateUserRequest) -> Result<(), AppError> {
    if let Some(ref email) = payload.email {
        validate_email(email)?;
    }
    if let Some(ref username) = payload.username {
        validate_username(username)?;
    }
    if let Some(ref password) = payload.password {
        validate_password(password, payload.password_confirm.as_deref())?;
    }
    Ok(())
}
