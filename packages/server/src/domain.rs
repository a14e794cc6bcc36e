//! Construction of new rows from validated input.
//!
//! Nothing here touches the database; handlers persist the returned models.

use chrono::{DateTime, Utc};
use sea_orm::Set;

use crate::config::ImagesConfig;
use crate::entity::{city, country, file, home_destination, image, user};
use crate::error::AppError;
use crate::models::city::{CITY_ORDER_DEFAULT, CreateCityRequest};
use crate::models::country::CreateCountryRequest;
use crate::models::image::{CreateImageRequest, normalize_image_filename};
use crate::models::shared::location_to_wkt;
use crate::models::user::normalize_identity;
use crate::utils::slug::{normalize_country_code, slugify};
use crate::utils::url_rewrite::premier_image_url;

/// Slug from an explicit value, falling back to the name.
pub fn resolve_slug(slug: Option<&str>, name: &str) -> Result<String, AppError> {
    let source = slug.filter(|s| !s.trim().is_empty()).unwrap_or(name);
    let slug = slugify(source);
    if slug.is_empty() {
        return Err(AppError::Validation(
            "Slug must contain at least one letter or digit".into(),
        ));
    }
    Ok(slug)
}

pub fn build_user(
    email: &str,
    username: &str,
    hashed_password: String,
    is_active: bool,
    is_superuser: bool,
    now: DateTime<Utc>,
) -> user::ActiveModel {
    user::ActiveModel {
        email: Set(normalize_identity(email)),
        username: Set(normalize_identity(username)),
        hashed_password: Set(hashed_password),
        is_active: Set(is_active),
        is_superuser: Set(is_superuser),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

pub fn build_country(
    payload: &CreateCountryRequest,
    now: DateTime<Utc>,
) -> Result<country::ActiveModel, AppError> {
    let location = payload
        .location
        .as_deref()
        .map(location_to_wkt)
        .transpose()?;

    Ok(country::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        slug: Set(resolve_slug(payload.slug.as_deref(), &payload.name)?),
        country_code: Set(normalize_country_code(&payload.country_code)),
        location: Set(location),
        image_id: Set(payload.image_id),
        image_url: Set(payload.image_url.clone()),
        showon_destmenu: Set(payload.showon_destmenu),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
}

pub fn build_city(
    payload: &CreateCityRequest,
    now: DateTime<Utc>,
) -> Result<city::ActiveModel, AppError> {
    let location = payload
        .location
        .as_deref()
        .map(location_to_wkt)
        .transpose()?;

    Ok(city::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        slug: Set(resolve_slug(payload.slug.as_deref(), &payload.name)?),
        country_id: Set(Some(payload.country_id)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        order: Set(payload.order.unwrap_or(CITY_ORDER_DEFAULT)),
        location: Set(location),
        image_id: Set(payload.image_id),
        image_url: Set(payload.image_url.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
}

/// Image registered from an existing URL.
pub fn build_image_from_url(
    payload: &CreateImageRequest,
    images: &ImagesConfig,
    now: DateTime<Utc>,
) -> image::ActiveModel {
    let url = payload.image_url.trim();
    image::ActiveModel {
        filename: Set(normalize_image_filename(&payload.filename)),
        image_url: Set(url.to_string()),
        premier_image_url: Set(premier_image_url(url, &images.legacy_hosts, &images.cdn_host)),
        backup_image_url: Set(payload.backup_image_url.clone()),
        file_id: Set(payload.file_id),
        order: Set(payload.order),
        description: Set(payload.description.clone()),
        alt_text: Set(payload.alt_text.clone()),
        is_active: Set(true),
        is_deleted: Set(false),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

/// Optional metadata supplied alongside an uploaded image.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImageMeta {
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub order: i32,
}

/// Image backed by a freshly uploaded file.
pub fn build_image_from_file(
    file: &file::Model,
    meta: ImageMeta,
    images: &ImagesConfig,
    now: DateTime<Utc>,
) -> image::ActiveModel {
    image::ActiveModel {
        filename: Set(normalize_image_filename(&file.filename)),
        image_url: Set(file.public_url.clone()),
        premier_image_url: Set(premier_image_url(
            &file.public_url,
            &images.legacy_hosts,
            &images.cdn_host,
        )),
        backup_image_url: Set(Some(file.public_url.clone())),
        file_id: Set(Some(file.id)),
        order: Set(meta.order),
        description: Set(meta.description),
        alt_text: Set(meta.alt_text),
        is_active: Set(true),
        is_deleted: Set(false),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

pub fn build_home_destination(
    city: &str,
    order: i32,
    is_active: bool,
    file: Option<&file::Model>,
    now: DateTime<Utc>,
) -> home_destination::ActiveModel {
    home_destination::ActiveModel {
        city: Set(city.trim().to_lowercase()),
        order: Set(order),
        is_active: Set(is_active),
        image: Set(file.map(|f| f.id)),
        image_url: Set(file.map(|f| f.public_url.clone())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}
