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
use crate::domain::{build_country, resolve_slug};
use crate::entity::country;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::country::*;
use crate::models::envelope::{ApiResponse, ListResponse};
use crate::models::shared::{PageWindow, like_pattern, location_to_wkt};
use crate::state::AppState;
use crate::utils::slug::normalize_country_code;

async fn find_country<C: ConnectionTrait>(db: &C, id: i32) -> Result<country::Model, AppError> {
    country::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Country not found".into()))
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    exclude: Option<i32>,
) -> Result<(), AppError> {
    let mut select = country::Entity::find().filter(country::Column::Slug.eq(slug));
    if let Some(id) = exclude {
        select = select.filter(country::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        warn!(slug, "Country slug already taken");
        return Err(slug_taken(slug));
    }
    Ok(())
}

async fn ensure_code_free<C: ConnectionTrait>(
    db: &C,
    code: &str,
    exclude: Option<i32>,
) -> Result<(), AppError> {
    let mut select = country::Entity::find().filter(country::Column::CountryCode.eq(code));
    if let Some(id) = exclude {
        select = select.filter(country::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        warn!(code, "Country code already taken");
        return Err(code_taken(code));
    }
    Ok(())
}

fn slug_taken(slug: &str) -> AppError {
    AppError::conflict_on(
        "COUNTRY_SLUG_EXISTS",
        format!("A country with slug '{slug}' already exists"),
        "slug",
        slug,
    )
}

fn code_taken(code: &str) -> AppError {
    AppError::conflict_on(
        "COUNTRY_CODE_EXISTS",
        format!("A country with code '{code}' already exists"),
        "country_code",
        code,
    )
}

fn country_conflict() -> AppError {
    AppError::conflict(
        "COUNTRY_EXISTS",
        "A country with this slug or code already exists",
    )
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Countries",
    operation_id = "listCountries",
    summary = "List countries",
    description = "Paginated, ordered by name. `search` matches the name case-insensitively.",
    params(CountryListQuery),
    responses(
        (status = 200, description = "Countries", body = ListResponse<CountryResponse>),
        (status = 400, description = "Bad query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_countries(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CountryListQuery>,
) -> Result<Json<ListResponse<CountryResponse>>, AppError> {
    let window = PageWindow::new(query.skip, query.limit);
    let mut select = country::Entity::find();

    if let Some(flag) = query.showon_destmenu {
        select = select.filter(country::Column::ShowonDestmenu.eq(flag));
    }
    if let Some(pattern) = like_pattern(query.search.as_deref()) {
        select = select.filter(
            Expr::expr(Func::lower(Expr::col(country::Column::Name)))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    let (total, rows) = tokio::try_join!(
        select.clone().count(&state.db),
        select
            .order_by_asc(country::Column::Name)
            .offset(window.skip)
            .limit(window.limit)
            .all(&state.db),
    )?;

    Ok(ListResponse::new(
        rows.into_iter().map(Into::into).collect(),
        total,
        window,
        "Countries retrieved",
    ))
}

#[utoipa::path(
    get,
    path = "/destination-menu",
    tag = "Countries",
    operation_id = "listDestinationMenuCountries",
    summary = "Countries shown in the destination menu",
    description = "All countries with `showon_destmenu = true`, ordered by name.",
    responses((status = 200, description = "Menu countries", body = ApiResponse<Vec<CountryResponse>>)),
)]
#[instrument(skip(state))]
pub async fn destination_menu(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CountryResponse>>>, AppError> {
    let rows = country::Entity::find()
        .filter(country::Column::ShowonDestmenu.eq(true))
        .order_by_asc(country::Column::Name)
        .all(&state.db)
        .await?;
    Ok(ApiResponse::ok(
        rows.into_iter().map(Into::into).collect(),
        "Destination menu countries retrieved",
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Countries",
    operation_id = "getCountry",
    summary = "Get a country by ID",
    params(("id" = i32, Path, description = "Country ID")),
    responses(
        (status = 200, description = "Country", body = ApiResponse<CountryResponse>),
        (status = 404, description = "Country not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_country(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CountryResponse>>, AppError> {
    let model = find_country(&state.db, id).await?;
    Ok(ApiResponse::ok(model.into(), "Country retrieved"))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "Countries",
    operation_id = "getCountryBySlug",
    summary = "Get a country by slug",
    params(("slug" = String, Path, description = "Country slug")),
    responses(
        (status = 200, description = "Country", body = ApiResponse<CountryResponse>),
        (status = 404, description = "Country not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn get_country_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<CountryResponse>>, AppError> {
    let model = country::Entity::find()
        .filter(country::Column::Slug.eq(slug.trim().to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Country not found".into()))?;
    Ok(ApiResponse::ok(model.into(), "Country retrieved"))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Countries",
    operation_id = "createCountry",
    summary = "Create a country",
    description = "The slug is derived from the name when omitted. The country code is stored uppercased.",
    request_body = CreateCountryRequest,
    responses(
        (status = 201, description = "Country created", body = ApiResponse<CountryResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR, IMAGE_NOT_FOUND)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Duplicate (COUNTRY_SLUG_EXISTS, COUNTRY_CODE_EXISTS)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, name = %payload.name))]
pub async fn create_country(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCountryRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_country(&payload)?;

    let active = build_country(&payload, Utc::now())?;
    if let ActiveValue::Set(ref slug) = active.slug {
        ensure_slug_free(&state.db, slug, None).await?;
    }
    if let ActiveValue::Set(ref code) = active.country_code {
        ensure_code_free(&state.db, code, None).await?;
    }
    if let Some(image_id) = payload.image_id {
        ensure_image_exists(&state.db, image_id).await?;
    }

    let model = active
        .insert(&state.db)
        .await
        .map_err(|e| unique_violation(e, country_conflict))?;

    info!(country_id = model.id, slug = %model.slug, "Country created");
    let id = model.id;
    Ok(ApiResponse::created(CountryResponse::from(model), id, "Country created successfully"))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Countries",
    operation_id = "updateCountry",
    summary = "Update a country",
    description = "Partial update; only provided fields change and `null` clears nullable ones. Also served on PATCH.",
    params(("id" = i32, Path, description = "Country ID")),
    request_body = UpdateCountryRequest,
    responses(
        (status = 200, description = "Country updated", body = ApiResponse<CountryResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR, IMAGE_NOT_FOUND)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Country not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate (COUNTRY_SLUG_EXISTS, COUNTRY_CODE_EXISTS)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_country(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCountryRequest>,
) -> Result<Json<ApiResponse<CountryResponse>>, AppError> {
    validate_update_country(&payload)?;

    if payload == UpdateCountryRequest::default() {
        let existing = find_country(&state.db, id).await?;
        return Ok(ApiResponse::ok(existing.into(), "Country unchanged"));
    }

    let txn = state.db.begin().await?;
    let existing = find_country(&txn, id).await?;

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
    let code = payload.country_code.as_deref().map(normalize_country_code);
    if let Some(ref code) = code
        && *code != existing.country_code
    {
        ensure_code_free(&txn, code, Some(id)).await?;
    }
    if let Some(Some(image_id)) = payload.image_id {
        ensure_image_exists(&txn, image_id).await?;
    }

    let mut active: country::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name.to_string());
    }
    if let Some(slug) = slug {
        active.slug = Set(slug);
    }
    if let Some(code) = code {
        active.country_code = Set(code);
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
    if let Some(flag) = payload.showon_destmenu {
        active.showon_destmenu = Set(flag);
    }
    active.updated_at = Set(Utc::now());

    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation(e, country_conflict))?;
    txn.commit().await?;

    info!(country_id = id, "Country updated");
    Ok(ApiResponse::ok(model.into(), "Country updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Countries",
    operation_id = "deleteCountry",
    summary = "Delete a country",
    description = "Permanently deletes the country. Fails with 409 while cities still reference it.",
    params(("id" = i32, Path, description = "Country ID")),
    responses(
        (status = 204, description = "Country deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Country not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Still referenced (RESOURCE_IN_USE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_country(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let result = country::Entity::delete_by_id(id)
        .exec(&state.db)
        .await
        .map_err(|e| still_referenced(e, "Country"))?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Country not found".into()));
    }

    info!(country_id = id, "Country deleted");
    Ok(StatusCode::NO_CONTENT)
}
