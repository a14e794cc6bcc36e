use std::time::Duration;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument, warn};

use crate::entity::file;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AdminUser, AuthUser};
use crate::extractors::query::AppQuery;
use crate::models::envelope::{ApiResponse, ListResponse};
use crate::models::file::*;
use crate::models::shared::PageWindow;
use crate::state::AppState;
use crate::upload::{read_form, upload_spooled};

/// Longest lifetime a signed URL may be requested for (7 days).
const MAX_SIGNED_URL_SECS: u64 = 7 * 24 * 3600;

async fn find_file<C: ConnectionTrait>(db: &C, id: i32) -> Result<file::Model, AppError> {
    file::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".into()))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Storage",
    operation_id = "uploadFile",
    summary = "Upload a file to object storage",
    description = "Multipart form with a required `file` part. Only JPEG, PNG and GIF content is accepted. \
        The object is stored publicly under a randomized name.",
    request_body(content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 201, description = "File stored", body = ApiResponse<FileResponse>),
        (status = 400, description = "Bad upload (VALIDATION_ERROR, FILE_REQUIRED, UNSUPPORTED_FILE_TYPE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_ERROR)", body = ErrorBody),
        (status = 503, description = "No storage configured (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart, state.config.storage.max_upload_size).await?;
    let spooled = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::bad_request("FILE_REQUIRED", "A 'file' field is required"))?;

    let model = upload_spooled(&state.db, state.object_store.as_deref(), spooled).await?;

    info!(file_id = model.id, size = model.size, "File uploaded");
    let id = model.id;
    Ok(ApiResponse::created(FileResponse::from(model), id, "File uploaded successfully"))
}

#[utoipa::path(
    get,
    path = "/files",
    tag = "Storage",
    operation_id = "listFiles",
    summary = "List uploaded files",
    description = "Newest first. Soft-deleted files are hidden unless `include_deleted=true`.",
    params(FileListQuery),
    responses(
        (status = 200, description = "Files", body = ListResponse<FileResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_files(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FileListQuery>,
) -> Result<Json<ListResponse<FileResponse>>, AppError> {
    let window = PageWindow::new(query.skip, query.limit);
    let mut select = file::Entity::find();
    if !query.include_deleted.unwrap_or(false) {
        select = select.filter(file::Column::IsDeleted.eq(false));
    }

    let (total, rows) = tokio::try_join!(
        select.clone().count(&state.db),
        select
            .order_by_desc(file::Column::CreatedAt)
            .order_by_desc(file::Column::Id)
            .offset(window.skip)
            .limit(window.limit)
            .all(&state.db),
    )?;

    Ok(ListResponse::new(
        rows.into_iter().map(Into::into).collect(),
        total,
        window,
        "Files retrieved",
    ))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    tag = "Storage",
    operation_id = "getFile",
    summary = "Get file metadata",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 200, description = "File", body = ApiResponse<FileResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FileResponse>>, AppError> {
    let model = find_file(&state.db, id).await?;
    Ok(ApiResponse::ok(model.into(), "File retrieved"))
}

#[utoipa::path(
    get,
    path = "/files/{id}/signed-url",
    tag = "Storage",
    operation_id = "getSignedUrl",
    summary = "Time-limited download URL",
    description = "Signs a GET URL for the stored object. `expires_in` is in seconds, 1 to 604800; \
        defaults to the configured expiry.",
    params(("id" = i32, Path, description = "File ID"), SignedUrlQuery),
    responses(
        (status = 200, description = "Signed URL", body = ApiResponse<SignedUrlResponse>),
        (status = 400, description = "Bad expiry (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found, deleted or held by another provider (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "No storage configured (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id, id))]
pub async fn signed_url(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(query): AppQuery<SignedUrlQuery>,
) -> Result<Json<ApiResponse<SignedUrlResponse>>, AppError> {
    let expires_in = query
        .expires_in
        .unwrap_or(state.config.storage.signed_url_expiry_secs);
    if !(1..=MAX_SIGNED_URL_SECS).contains(&expires_in) {
        return Err(AppError::Validation(format!(
            "expires_in must be between 1 and {MAX_SIGNED_URL_SECS} seconds"
        )));
    }

    let model = find_file(&state.db, id).await?;
    if model.is_deleted {
        return Err(AppError::NotFound("File not found".into()));
    }
    let store = state
        .object_store
        .as_deref()
        .ok_or(AppError::StorageUnavailable)?;
    if model.provider != store.provider() {
        warn!(
            stored = %model.provider,
            active = store.provider(),
            "File was uploaded to a different provider"
        );
        return Err(AppError::NotFound(
            "File is not held by the active storage provider".into(),
        ));
    }

    let url = store
        .signed_url(&model.blob_name, Duration::from_secs(expires_in))
        .await?;

    Ok(ApiResponse::ok(
        SignedUrlResponse { url, expires_in },
        "Signed URL generated",
    ))
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    tag = "Storage",
    operation_id = "deleteFile",
    summary = "Soft-delete a file",
    description = "Flags the file deleted. The stored object is kept so existing image URLs keep working.",
    params(("id" = i32, Path, description = "File ID")),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_file(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_file(&state.db, id).await?;
    if !existing.is_deleted {
        let mut active: file::ActiveModel = existing.into();
        active.is_deleted = Set(true);
        active.updated_at = Set(Utc::now());
        active.update(&state.db).await?;
        info!(file_id = id, "File soft-deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/objects",
    tag = "Storage",
    operation_id = "listBucketObjects",
    summary = "List raw bucket objects",
    description = "Lists objects in the configured bucket, optionally filtered by key prefix. \
        Includes objects with no file record. Administrators only.",
    params(ObjectListQuery),
    responses(
        (status = 200, description = "Bucket objects", body = ApiResponse<Vec<BucketObjectResponse>>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID, INACTIVE_USER)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 503, description = "No storage configured (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _admin, query))]
pub async fn list_objects(
    _admin: AdminUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ObjectListQuery>,
) -> Result<Json<ApiResponse<Vec<BucketObjectResponse>>>, AppError> {
    let store = state
        .object_store
        .as_deref()
        .ok_or(AppError::StorageUnavailable)?;
    let objects = store.list(query.prefix.as_deref().unwrap_or("")).await?;
    Ok(ApiResponse::ok(
        objects.into_iter().map(Into::into).collect(),
        "Bucket objects retrieved",
    ))
}
