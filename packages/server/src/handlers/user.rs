use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::{info, instrument};

use super::auth::{ensure_identity_free, identity_conflict};
use super::unique_violation;
use crate::domain::build_user;
use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::envelope::{ApiResponse, ListResponse};
use crate::models::shared::{PageWindow, like_pattern};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::hash;

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "Paginated user list. `search` matches username or email case-insensitively. Administrators only.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = ListResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, INACTIVE_USER)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _admin, query))]
pub async fn list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<ListResponse<UserResponse>>, AppError> {
    let window = PageWindow::new(query.skip, query.limit);
    let mut select = user::Entity::find();

    if let Some(pattern) = like_pattern(query.search.as_deref()) {
        select = select.filter(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(user::Column::Email)))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }
    if let Some(active) = query.is_active {
        select = select.filter(user::Column::IsActive.eq(active));
    }

    let (total, rows) = tokio::try_join!(
        select.clone().count(&state.db),
        select
            .order_by_asc(user::Column::Id)
            .offset(window.skip)
            .limit(window.limit)
            .all(&state.db),
    )?;

    Ok(ListResponse::new(
        rows.into_iter().map(Into::into).collect(),
        total,
        window,
        "Users retrieved",
    ))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Creates an account, optionally inactive or administrator. Administrators only.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR, PASSWORD_MISMATCH)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, INACTIVE_USER)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Identity taken (EMAIL_EXISTS, USERNAME_EXISTS)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.0.id, username = %payload.username))]
pub async fn create_user(
    admin: AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_user(&payload)?;
    ensure_identity_free(&state.db, Some(&payload.email), Some(&payload.username), None).await?;

    let hashed = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let model = build_user(
        &payload.email,
        &payload.username,
        hashed,
        payload.is_active.unwrap_or(true),
        payload.is_superuser.unwrap_or(false),
        Utc::now(),
    )
    .insert(&state.db)
    .await
    .map_err(|e| unique_violation(e, identity_conflict))?;

    info!(user_id = model.id, "User created");
    let id = model.id;
    Ok(ApiResponse::created(UserResponse::from(model), id, "User created successfully"))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, INACTIVE_USER)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _admin), fields(id))]
pub async fn get_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let model = find_user(&state.db, id).await?;
    Ok(ApiResponse::ok(model.into(), "User retrieved"))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Partial update; only provided fields change. A new password is re-hashed and must be confirmed. Also served on PATCH.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR, PASSWORD_MISMATCH)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, INACTIVE_USER)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Identity taken (EMAIL_EXISTS, USERNAME_EXISTS)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _admin, payload), fields(id))]
pub async fn update_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    validate_update_user(&payload)?;

    if payload == UpdateUserRequest::default() {
        let existing = find_user(&state.db, id).await?;
        return Ok(ApiResponse::ok(existing.into(), "User unchanged"));
    }

    let hashed = payload
        .password
        .as_deref()
        .map(hash::hash_password)
        .transpose()
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let txn = state.db.begin().await?;
    let existing = find_user(&txn, id).await?;

    let email = payload
        .email
        .as_deref()
        .filter(|e| normalize_identity(e) != existing.email);
    let username = payload
        .username
        .as_deref()
        .filter(|u| normalize_identity(u) != existing.username);
    ensure_identity_free(&txn, email, username, Some(id)).await?;

    let mut active: user::ActiveModel = existing.into();
    if let Some(email) = email {
        active.email = Set(normalize_identity(email));
    }
    if let Some(username) = username {
        active.username = Set(normalize_identity(username));
    }
    if let Some(hashed) = hashed {
        active.hashed_password = Set(hashed);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_superuser) = payload.is_superuser {
        active.is_superuser = Set(is_superuser);
    }
    active.updated_at = Set(Utc::now());

    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation(e, identity_conflict))?;
    txn.commit().await?;

    info!(user_id = id, "User updated");
    Ok(ApiResponse::ok(model.into(), "User updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Permanently deletes the account. Administrators cannot delete themselves.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Attempted self-deletion (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, INACTIVE_USER)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(id))]
pub async fn delete_user(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    if admin.0.id == id {
        return Err(AppError::Validation("You cannot delete your own account".into()));
    }

    let result = user::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    info!(user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
