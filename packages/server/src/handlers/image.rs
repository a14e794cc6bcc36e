use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::domain::{ImageMeta, build_image_from_file, build_image_from_url};
use crate::entity::{file, image};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::envelope::{ApiResponse, ListResponse};
use crate::models::image::*;
use crate::models::shared::{PageWindow, parse_form_int, validate_optional_len, validate_order};
use crate::state::AppState;
use crate::upload::{read_form, upload_spooled};
use crate::utils::url_rewrite::premier_image_url;

async fn find_image<C: ConnectionTrait>(db: &C, id: i32) -> Result<image::Model, AppError> {
    image::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))
}

/// 400 `IMAGE_NOT_FOUND` unless an image row with `id` exists.
pub(crate) async fn ensure_image_exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    if image::Entity::find_by_id(id).count(db).await? == 0 {
        return Err(AppError::bad_request(
            "IMAGE_NOT_FOUND",
            format!("Image {id} does not exist"),
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Images",
    operation_id = "uploadImage",
    summary = "Upload an image file",
    description = "Multipart form with a required `file` (JPEG, PNG or GIF, detected from content) and optional \
        `description`, `alt_text` and `order`. The file is stored publicly and an image row is created \
        pointing at it.",
    request_body(content_type = "multipart/form-data", description = "Image file with optional metadata"),
    responses(
        (status = 201, description = "Image created", body = ApiResponse<ImageResponse>),
        (status = 400, description = "Bad upload (VALIDATION_ERROR, FILE_REQUIRED, UNSUPPORTED_FILE_TYPE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Storage failure (STORAGE_ERROR)", body = ErrorBody),
        (status = 503, description = "No storage configured (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart, state.config.storage.max_upload_size).await?;

    let meta = ImageMeta {
        description: form.text("description").map(str::to_string),
        alt_text: form.text("alt_text").map(str::to_string),
        order: form
            .text("order")
            .map(|raw| parse_form_int(raw, "order"))
            .transpose()?
            .unwrap_or(0),
    };
    validate_optional_len(meta.description.as_deref(), "Description", 1000)?;
    validate_optional_len(meta.alt_text.as_deref(), "Alt text", 255)?;
    validate_order(meta.order, 0, IMAGE_ORDER_MAX)?;

    let spooled = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::bad_request("FILE_REQUIRED", "A 'file' field is required"))?;

    let stored = upload_spooled(&state.db, state.object_store.as_deref(), spooled).await?;

    let model = build_image_from_file(&stored, meta, &state.config.images, Utc::now())
        .insert(&state.db)
        .await?;

    info!(image_id = model.id, file_id = stored.id, "Image uploaded");
    let id = model.id;
    Ok(ApiResponse::created(ImageResponse::from(model), id, "Image uploaded successfully"))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Images",
    operation_id = "createImage",
    summary = "Register an image by URL",
    description = "Creates an image row for an already hosted URL. Legacy storage hosts are rewritten \
        into `premier_image_url`.",
    request_body = CreateImageRequest,
    responses(
        (status = 201, description = "Image created", body = ApiResponse<ImageResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR, FILE_NOT_FOUND)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateImageRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_image(&payload)?;

    if let Some(file_id) = payload.file_id
        && file::Entity::find_by_id(file_id).count(&state.db).await? == 0
    {
        return Err(AppError::bad_request(
            "FILE_NOT_FOUND",
            format!("File {file_id} does not exist"),
        ));
    }

    let model = build_image_from_url(&payload, &state.config.images, Utc::now())
        .insert(&state.db)
        .await?;

    info!(image_id = model.id, "Image created");
    let id = model.id;
    Ok(ApiResponse::created(ImageResponse::from(model), id, "Image created successfully"))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Images",
    operation_id = "listImages",
    summary = "List images",
    description = "Ordered by `order` then newest first. Soft-deleted images are excluded unless `active_only=false`.",
    params(ImageListQuery),
    responses(
        (status = 200, description = "Images", body = ListResponse<ImageResponse>),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_images(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ImageListQuery>,
) -> Result<Json<ListResponse<ImageResponse>>, AppError> {
    let window = PageWindow::new(query.skip, query.limit);
    let mut select = image::Entity::find();
    if query.active_only.unwrap_or(true) {
        select = select.filter(image::Column::IsDeleted.eq(false));
    }

    let (total, rows) = tokio::try_join!(
        select.clone().count(&state.db),
        select
            .order_by_asc(image::Column::Order)
            .order_by_desc(image::Column::CreatedAt)
            .offset(window.skip)
            .limit(window.limit)
            .all(&state.db),
    )?;

    Ok(ListResponse::new(
        rows.into_iter().map(Into::into).collect(),
        total,
        window,
        "Images retrieved",
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Images",
    operation_id = "getImage",
    summary = "Get an image by ID",
    description = "Soft-deleted images are still returned, with `is_deleted` set.",
    params(("id" = i32, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image", body = ApiResponse<ImageResponse>),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ImageResponse>>, AppError> {
    let model = find_image(&state.db, id).await?;
    Ok(ApiResponse::ok(model.into(), "Image retrieved"))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Images",
    operation_id = "updateImage",
    summary = "Update an image",
    description = "Partial update. Changing `image_url` recomputes `premier_image_url`. Also served on PATCH.",
    params(("id" = i32, Path, description = "Image ID")),
    request_body = UpdateImageRequest,
    responses(
        (status = 200, description = "Image updated", body = ApiResponse<ImageResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateImageRequest>,
) -> Result<Json<ApiResponse<ImageResponse>>, AppError> {
    validate_update_image(&payload)?;

    if payload == UpdateImageRequest::default() {
        let existing = find_image(&state.db, id).await?;
        return Ok(ApiResponse::ok(existing.into(), "Image unchanged"));
    }

    let txn = state.db.begin().await?;
    let existing = find_image(&txn, id).await?;
    let mut active: image::ActiveModel = existing.into();

    if let Some(ref filename) = payload.filename {
        active.filename = Set(normalize_image_filename(filename));
    }
    if let Some(ref url) = payload.image_url {
        let images = &state.config.images;
        let url = url.trim();
        active.image_url = Set(url.to_string());
        active.premier_image_url = Set(premier_image_url(url, &images.legacy_hosts, &images.cdn_host));
    }
    if let Some(backup) = payload.backup_image_url {
        active.backup_image_url = Set(backup);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(alt_text) = payload.alt_text {
        active.alt_text = Set(alt_text);
    }
    if let Some(order) = payload.order {
        active.order = Set(order);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    info!(image_id = id, "Image updated");
    Ok(ApiResponse::ok(model.into(), "Image updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Soft-delete an image",
    description = "Marks the image deleted and records `deleted_at`. The row stays retrievable by ID and \
        drops out of `active_only` listings. Deleting twice is a no-op.",
    params(("id" = i32, Path, description = "Image ID")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_image(&state.db, id).await?;
    if existing.is_deleted {
        return Ok(StatusCode::NO_CONTENT);
    }

    let now = Utc::now();
    let mut active: image::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(&state.db).await?;

    info!(image_id = id, "Image soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
