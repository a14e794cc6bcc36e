use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use super::unique_violation;
use crate::domain::build_user;
use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginIdentity, LoginRequest, RegisterRequest, TokenResponse, login_identity,
    validate_register,
};
use crate::models::envelope::ApiResponse;
use crate::models::user::{UserResponse, normalize_identity};
use crate::state::AppState;
use crate::utils::{hash, jwt};

/// Reject an email or username already held by another account.
///
/// `exclude` skips the account being updated.
pub(crate) async fn ensure_identity_free<C: ConnectionTrait>(
    db: &C,
    email: Option<&str>,
    username: Option<&str>,
    exclude: Option<i32>,
) -> Result<(), AppError> {
    let taken = |column: user::Column, value: String| {
        let mut select = user::Entity::find().filter(column.eq(value));
        if let Some(id) = exclude {
            select = select.filter(user::Column::Id.ne(id));
        }
        select
    };

    if let Some(email) = email {
        let email = normalize_identity(email);
        if taken(user::Column::Email, email.clone()).count(db).await? > 0 {
            return Err(AppError::conflict_on(
                "EMAIL_EXISTS",
                "Email is already registered",
                "email",
                email,
            ));
        }
    }
    if let Some(username) = username {
        let username = normalize_identity(username);
        if taken(user::Column::Username, username.clone()).count(db).await? > 0 {
            return Err(AppError::conflict_on(
                "USERNAME_EXISTS",
                "Username is already taken",
                "username",
                username,
            ));
        }
    }
    Ok(())
}

pub(crate) fn identity_conflict() -> AppError {
    AppError::conflict("USER_EXISTS", "Email or username is already in use")
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates an active, non-administrator account.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR, PASSWORD_MISMATCH)", body = ErrorBody),
        (status = 409, description = "Identity taken (EMAIL_EXISTS, USERNAME_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register(&payload)?;
    ensure_identity_free(&state.db, Some(&payload.email), Some(&payload.username), None).await?;

    let hashed = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let model = build_user(&payload.email, &payload.username, hashed, true, false, Utc::now())
        .insert(&state.db)
        .await
        .map_err(|e| unique_violation(e, identity_conflict))?;

    info!(user_id = model.id, "User registered");
    let id = model.id;
    Ok(ApiResponse::created(
        UserResponse::from(model),
        id,
        "User registered successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Exchange credentials for an access token",
    description = "Accepts either `email` or `username` with `password`. Returns a bearer token.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<TokenResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials or inactive account (INVALID_CREDENTIALS, INACTIVE_USER)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    let filter = match login_identity(&payload)? {
        LoginIdentity::Email(email) => user::Column::Email.eq(email),
        LoginIdentity::Username(username) => user::Column::Username.eq(username),
    };

    let user = user::Entity::find()
        .filter(filter)
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.hashed_password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AppError::InactiveUser);
    }

    let issued = jwt::sign(user.id, &state.config.auth)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    info!(user_id = user.id, "User logged in");
    Ok(ApiResponse::ok(
        TokenResponse {
            access_token: issued.token,
            token_type: "bearer",
            expires_in: issued.expires_in,
            user: user.into(),
        },
        "Login successful",
    ))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Current account",
    responses(
        (status = 200, description = "The authenticated account", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;
    Ok(ApiResponse::ok(user.into(), "Current user"))
}
