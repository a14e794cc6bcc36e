use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::{info, instrument, warn};

use super::image::ensure_image_exists;
use super::{still_referenced, unique_violation};
use crate::domain::{build_city, resolve_slug};
use crate::entity::{city, country};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::city::*;
use crate::models::envelope::{ApiResponse, ListResponse};
use crate::models::shared::{PageWindow, like_pattern, location_to_wkt};
use crate::state::AppState;

async fn find_city<C: ConnectionTrait>(db: &C, id: i32) -> Result<city::Model, AppError> {
    city::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".into()))
}

/// 400 `COUNTRY_NOT_FOUND` unless the referenced country exists.
async fn ensure_country_exists<C: ConnectionTrait>(db: &C, country_id: i32) -> Result<(), AppError> {
    if country::Entity::find_by_id(country_id).count(db).await? == 0 {
        warn!(country_id, "City references a missing country");
        return Err(AppError::bad_request(
            "COUNTRY_NOT_FOUND",
            format!("Country {country_id} does not exist"),
        ));
    }
    Ok(())
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    exclude: Option<i32>,
) -> Result<(), AppError> {
    let mut select = city::Entity::find().filter(city::Column::Slug.eq(slug));
    if let Some(id) = exclude {
        select = select.filter(city::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        warn!(slug, "City slug already taken");
        return Err(AppError::conflict_on(
            "CITY_SLUG_EXISTS",
            format!("A city with slug '{slug}' already exists"),
            "slug",
            slug,
        ));
    }
    Ok(())
}

fn slug_conflict() -> AppError {
    AppError::conflict("CITY_SLUG_EXISTS", "A city with this slug already exists")
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Cities",
    operation_id = "listCities",
    summary = "List cities",
    description = "Paginated, ordered by `order` ascending then newest first. Filters: `is_active`, \
        `country_id`, and `search` on the name.",
    params(CityListQuery),
    responses(
        (status = 200, description = "Cities", body = ListResponse<CityResponse>),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_cities(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CityListQuery>,
) -> Result<Json<ListResponse<CityResponse>>, AppError> {
    let window = PageWindow::new(query.skip, query.limit);
    let mut select = city::Entity::find();

    if let Some(active) = query.is_active {
        select = select.filter(city::Column::IsActive.eq(active));
    }
    if let Some(country_id) = query.country_id {
        select = select.filter(city::Column::CountryId.eq(country_id));
    }
    if let Some(pattern) = like_pattern(query.search.as_deref()) {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(city::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    let (total, rows) = tokio::try_join!(
        select.clone().count(&state.db),
        select
            .order_by_asc(city::Column::Order)
            .order_by_desc(city::Column::CreatedAt)
            .offset(window.skip)
            .limit(window.limit)
            .all(&state.db),
    )?;

    Ok(ListResponse::new(
        rows.into_iter().map(Into::into).collect(),
        total,
        window,
        "Cities retrieved",
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Cities",
    operation_id = "getCity",
    summary = "Get a city by ID",
    params(("id" = i32, Path, description = "City ID")),
    responses(
        (status = 200, description = "City", body = ApiResponse<CityResponse>),
        (status = 404, description = "City not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CityResponse>>, AppError> {
    let model = find_city(&state.db, id).await?;
    Ok(ApiResponse::ok(model.into(), "City retrieved"))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "Cities",
    operation_id = "getCityBySlug",
    summary = "Get a city by slug",
    params(("slug" = String, Path, description = "City slug")),
    responses(
        (status = 200, description = "City", body = ApiResponse<CityResponse>),
        (status = 404, description = "City not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn get_city_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<CityResponse>>, AppError> {
    let model = city::Entity::find()
        .filter(city::Column::Slug.eq(slug.trim().to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".into()))?;
    Ok(ApiResponse::ok(model.into(), "City retrieved"))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Cities",
    operation_id = "createCity",
    summary = "Create a city",
    description = "The referenced country must exist. The slug is derived from the name when omitted \
        and must be unique. `order` defaults to 9999.",
    request_body = CreateCityRequest,
    responses(
        (status = 201, description = "City created", body = ApiResponse<CityResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR, COUNTRY_NOT_FOUND, IMAGE_NOT_FOUND)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Duplicate slug (CITY_SLUG_EXISTS)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, name = %payload.name))]
pub async fn create_city(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCityRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_city(&payload)?;
    ensure_country_exists(&state.db, payload.country_id).await?;

    let active = build_city(&payload, Utc::now())?;
    if let ActiveValue::Set(ref slug) = active.slug {
        ensure_slug_free(&state.db, slug, None).await?;
    }
    if let Some(image_id) = payload.image_id {
        ensure_image_exists(&state.db, image_id).await?;
    }

    let model = active
        .insert(&state.db)
        .await
        .map_err(|e| unique_violation(e, slug_conflict))?;

    info!(city_id = model.id, slug = %model.slug, "City created");
    let id = model.id;
    Ok(ApiResponse::created(CityResponse::from(model), id, "City created successfully"))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Cities",
    operation_id = "updateCity",
    summary = "Update a city",
    description = "Partial update; only provided fields change and `null` clears nullable ones. \
        A new country or slug is checked like on create. Also served on PATCH.",
    params(("id" = i32, Path, description = "City ID")),
    request_body = UpdateCityRequest,
    responses(
        (status = 200, description = "City updated", body = ApiResponse<CityResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR, COUNTRY_NOT_FOUND, IMAGE_NOT_FOUND)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "City not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate slug (CITY_SLUG_EXISTS)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_city(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCityRequest>,
) -> Result<Json<ApiResponse<CityResponse>>, AppError> {
    validate_update_city(&payload)?;

    if payload == UpdateCityRequest::default() {
        let existing = find_city(&state.db, id).await?;
        return Ok(ApiResponse::ok(existing.into(), "City unchanged"));
    }

    let txn = state.db.begin().await?;
    let existing = find_city(&txn, id).await?;

    if let Some(Some(country_id)) = payload.country_id
        && existing.country_id != Some(country_id)
    {
        ensure_country_exists(&txn, country_id).await?;
    }
    let name = payload.name.as_deref().map(str::trim);
    let slug = payload
        .slug
        .as_deref()
        .map(|s| resolve_slug(Some(s), name.unwrap_or(&existing.name)))
        .transpose()?;
    if let Some(ref slug) = slug
        && *slug != existing.slug
    {
        ensure_slug_free(&txn, slug, Some(id)).await?;
    }
    if let Some(Some(image_id)) = payload.image_id {
        ensure_image_exists(&txn, image_id).await?;
    }

    let mut active: city::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name.to_string());
    }
    if let Some(slug) = slug {
        active.slug = Set(slug);
    }
    if let Some(country_id) = payload.country_id {
        active.country_id = Set(country_id);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(order) = payload.order {
        active.order = Set(order);
    }
    if let Some(location) = payload.location {
        active.location = Set(location.as_deref().map(location_to_wkt).transpose()?);
    }
    if let Some(image_id) = payload.image_id {
        active.image_id = Set(image_id);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    active.updated_at = Set(Utc::now());

    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation(e, slug_conflict))?;
    txn.commit().await?;

    info!(city_id = id, "City updated");
    Ok(ApiResponse::ok(model.into(), "City updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Cities",
    operation_id = "deleteCity",
    summary = "Delete a city",
    params(("id" = i32, Path, description = "City ID")),
    responses(
        (status = 204, description = "City deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "City not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Still referenced (RESOURCE_IN_USE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_city(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let result = city::Entity::delete_by_id(id)
        .exec(&state.db)
        .await
        .map_err(|e| still_referenced(e, "City"))?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("City not found".into()));
    }

    info!(city_id = id, "City deleted");
    Ok(StatusCode::NO_CONTENT)
}
