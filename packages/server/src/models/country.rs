use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use super::shared::{
    LocationOut, double_option, location_to_wkt, validate_len, validate_optional_len,
};
use crate::entity::country;
use crate::error::AppError;

#[derive(Serialize, utoipa::ToSchema)]
pub struct CountryResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "United States")]
    pub name: String,
    #[schema(example = "united-states")]
    pub slug: String,
    #[schema(example = "US")]
    pub country_code: String,
    pub location: Option<LocationOut>,
    pub image_id: Option<i32>,
    pub image_url: Option<String>,
    pub showon_destmenu: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<country::Model> for CountryResponse {
    fn from(m: country::Model) -> Self {
        Self {
            location: LocationOut::from_wkt(m.location.as_deref()),
            id: m.id,
            name: m.name,
            slug: m.slug,
            country_code: m.country_code,
            image_id: m.image_id,
            image_url: m.image_url,
            showon_destmenu: m.showon_destmenu,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Request body for creating a country.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCountryRequest {
    #[schema(example = "United States")]
    pub name: String,
    /// Normalized before storage; derived from `name` when omitted.
    #[schema(example = "united-states")]
    pub slug: Option<String>,
    /// 2-3 letters, stored uppercase.
    #[schema(example = "us")]
    pub country_code: String,
    /// `"lat,lng"` or `POINT(lng lat)`.
    #[schema(example = "38.9, -77.03")]
    pub location: Option<String>,
    pub image_id: Option<i32>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub showon_destmenu: bool,
}

/// Partial update. Absent fields are left unchanged; `null` clears nullable ones.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCountryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub image_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    pub showon_destmenu: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CountryListQuery {
    /// Rows to skip. Default: 0.
    pub skip: Option<u64>,
    /// Rows per page, 1-1000. Default: 100.
    pub limit: Option<u64>,
    pub showon_destmenu: Option<bool>,
    /// Case-insensitive match on the name.
    pub search: Option<String>,
}

pub fn validate_country_code(code: &str) -> Result<(), AppError> {
    let code = code.trim();
    if !(2..=3).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::Validation(
            "Country code must be 2-3 letters".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_country(payload: &CreateCountryRequest) -> Result<(), AppError> {
    validate_len(&payload.name, "Name", 1, 100)?;
    if let Some(ref slug) = payload.slug {
        validate_len(slug, "Slug", 1, 100)?;
    }
    validate_country_code(&payload.country_code)?;
    if let Some(ref location) = payload.location {
        location_to_wkt(location)?;
    }
    validate_optional_len(payload.image_url.as_deref(), "Image URL", 2048)
}

pub fn validate_update_country(payload: &UpdateCountryRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_len(name, "Name", 1, 100)?;
    }
    if let Some(ref slug) = payload.slug {
        validate_len(slug, "Slug", 1, 100)?;
    }
    if let Some(ref code) = payload.country_code {
        validate_country_code(code)?;
    }
    if let Some(Some(ref location)) = payload.location {
        location_to_wkt(location)?;
    }
    if let Some(ref image_url) = payload.image_url {
        validate_optional_len(image_url.as_deref(), "Image URL", 2048)?;
    }
    Ok(())
}
