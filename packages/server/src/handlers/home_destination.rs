use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::{info, instrument, warn};

use super::unique_violation;
use crate::domain::build_home_destination;
use crate::entity::home_destination;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::models::envelope::ApiResponse;
use crate::models::home_destination::*;
use crate::models::shared::{PageWindow, like_pattern, parse_form_bool, parse_form_int};
use crate::state::AppState;
use crate::upload::{UploadForm, read_form, upload_spooled};

async fn find_destination<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<home_destination::Model, AppError> {
    home_destination::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Home destination not found".into()))
}

/// Whether another destination already holds `order`.
async fn order_taken<C: ConnectionTrait>(
    db: &C,
    order: i32,
    exclude: Option<i32>,
) -> Result<bool, DbErr> {
    let mut select =
        home_destination::Entity::find().filter(home_destination::Column::Order.eq(order));
    if let Some(id) = exclude {
        select = select.filter(home_destination::Column::Id.ne(id));
    }
    Ok(select.count(db).await? > 0)
}

fn parse_fields(form: &UploadForm) -> Result<HomeDestinationFields, AppError> {
    let fields = HomeDestinationFields {
        city: form.text("city").map(str::to_string),
        order: form
            .text("order")
            .map(|raw| parse_form_int(raw, "order"))
            .transpose()?,
        is_active: form.text("is_active").map(parse_form_bool).transpose()?,
    };
    validate_home_fields(&fields)?;
    Ok(fields)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Home Destinations",
    operation_id = "createHomeDestination",
    summary = "Create a home-page destination",
    description = "Multipart form with `city`, `order` (1-999, unique), optional `is_active` (default false) \
        and a required image `file`. A taken order is rejected before anything is uploaded.",
    request_body(content_type = "multipart/form-data", description = "Destination fields and image file"),
    responses(
        (status = 201, description = "Destination created", body = ApiResponse<HomeDestinationResponse>),
        (status = 400, description = "Bad form (VALIDATION_ERROR, INVALID_ORDER, FILE_REQUIRED, UNSUPPORTED_FILE_TYPE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Order already used (ORDER_EXISTS)", body = ErrorBody),
        (status = 503, description = "No storage configured (STORAGE_UNAVAILABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_destination(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_form(multipart, state.config.storage.max_upload_size).await?;
    let fields = parse_fields(&form)?;

    let city = fields
        .city
        .ok_or_else(|| AppError::Validation("City is required".into()))?;
    let order = fields
        .order
        .ok_or_else(|| AppError::Validation("Order is required".into()))?;
    let spooled = form
        .file
        .as_ref()
        .ok_or_else(|| AppError::bad_request("FILE_REQUIRED", "An image file is required"))?;

    if order_taken(&state.db, order, None).await? {
        warn!(order, "Home destination order already taken");
        return Err(order_exists(order));
    }

    let stored = upload_spooled(&state.db, state.object_store.as_deref(), spooled).await?;

    let model = build_home_destination(
        &city,
        order,
        fields.is_active.unwrap_or(false),
        Some(&stored),
        Utc::now(),
    )
    .insert(&state.db)
    .await
    .map_err(|e| unique_violation(e, || order_exists(order)))?;

    info!(destination_id = model.id, order, "Home destination created");
    let id = model.id;
    Ok(ApiResponse::created(
        HomeDestinationResponse::from(model),
        id,
        "Home destination created successfully",
    ))
}

fn order_exists(order: i32) -> AppError {
    AppError::conflict_on(
        "ORDER_EXISTS",
        format!("Order {order} is already used by another destination"),
        "order",
        order,
    )
}

fn order_conflict(order: i32) -> AppError {
    AppError::conflict_on(
        "ORDER_CONFLICT",
        format!("Order {order} is already used by another destination"),
        "order",
        order,
    )
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Home Destinations",
    operation_id = "listHomeDestinations",
    summary = "List home-page destinations",
    description = "Ordered by `order`. Inactive destinations are excluded unless `active_only=false`. \
        `active_count` counts active destinations regardless of filters.",
    params(HomeDestinationListQuery),
    responses(
        (status = 200, description = "Destinations", body = ApiResponse<HomeDestinationList>),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_destinations(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<HomeDestinationListQuery>,
) -> Result<Json<ApiResponse<HomeDestinationList>>, AppError> {
    let window = PageWindow::new(query.skip, query.limit);
    let mut select = home_destination::Entity::find();

    if query.active_only.unwrap_or(true) {
        select = select.filter(home_destination::Column::IsActive.eq(true));
    }
    if let Some(pattern) = like_pattern(query.search.as_deref()) {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(home_destination::Column::City)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    let (total, active_count, rows) = tokio::try_join!(
        select.clone().count(&state.db),
        home_destination::Entity::find()
            .filter(home_destination::Column::IsActive.eq(true))
            .count(&state.db),
        select
            .order_by_asc(home_destination::Column::Order)
            .offset(window.skip)
            .limit(window.limit)
            .all(&state.db),
    )?;

    Ok(ApiResponse::ok(
        HomeDestinationList {
            destinations: rows.into_iter().map(Into::into).collect(),
            total,
            active_count,
        },
        "Home destinations retrieved",
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Home Destinations",
    operation_id = "getHomeDestination",
    summary = "Get a home-page destination",
    params(("id" = i32, Path, description = "Destination ID")),
    responses(
        (status = 200, description = "Destination", body = ApiResponse<HomeDestinationResponse>),
        (status = 404, description = "Destination not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_destination(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<HomeDestinationResponse>>, AppError> {
    let model = find_destination(&state.db, id).await?;
    Ok(ApiResponse::ok(model.into(), "Home destination retrieved"))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Home Destinations",
    operation_id = "updateHomeDestination",
    summary = "Update a home-page destination",
    description = "Multipart form; every field is optional. A new `order` must not be used by another \
        destination. A new `file` replaces the image. Also served on PATCH.",
    params(("id" = i32, Path, description = "Destination ID")),
    request_body(content_type = "multipart/form-data", description = "Fields to change and optional new image"),
    responses(
        (status = 200, description = "Destination updated", body = ApiResponse<HomeDestinationResponse>),
        (status = 400, description = "Bad form (VALIDATION_ERROR, INVALID_ORDER, UNSUPPORTED_FILE_TYPE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Destination not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Order already used (ORDER_CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id, id))]
pub async fn update_destination(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<HomeDestinationResponse>>, AppError> {
    let form = read_form(multipart, state.config.storage.max_upload_size).await?;
    let fields = parse_fields(&form)?;
    let existing = find_destination(&state.db, id).await?;

    if fields == HomeDestinationFields::default() && form.file.is_none() {
        return Ok(ApiResponse::ok(existing.into(), "Home destination unchanged"));
    }

    if let Some(order) = fields.order
        && order != existing.order
        && order_taken(&state.db, order, Some(id)).await?
    {
        warn!(order, "Home destination order already taken");
        return Err(order_conflict(order));
    }

    let stored = match form.file.as_ref() {
        Some(spooled) => Some(upload_spooled(&state.db, state.object_store.as_deref(), spooled).await?),
        None => None,
    };

    let mut active: home_destination::ActiveModel = existing.into();
    if let Some(city) = fields.city {
        active.city = Set(city.to_lowercase());
    }
    if let Some(order) = fields.order {
        active.order = Set(order);
    }
    if let Some(is_active) = fields.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(stored) = stored {
        active.image = Set(Some(stored.id));
        active.image_url = Set(Some(stored.public_url));
    }
    active.updated_at = Set(Utc::now());

    let conflict_order = fields.order.unwrap_or_default();
    let model = active
        .update(&state.db)
        .await
        .map_err(|e| unique_violation(e, || order_conflict(conflict_order)))?;

    info!(destination_id = id, "Home destination updated");
    Ok(ApiResponse::ok(model.into(), "Home destination updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Home Destinations",
    operation_id = "deleteHomeDestination",
    summary = "Delete a home-page destination",
    description = "Permanently deletes the destination. The uploaded image file is kept.",
    params(("id" = i32, Path, description = "Destination ID")),
    responses(
        (status = 204, description = "Destination deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Destination not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_destination(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let result = home_destination::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Home destination not found".into()));
    }

    info!(destination_id = id, "Home destination deleted");
    Ok(StatusCode::NO_CONTENT)
}
