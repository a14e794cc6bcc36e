use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use super::shared::{
    LocationOut, double_option, location_to_wkt, validate_len, validate_optional_len,
    validate_order,
};
use crate::entity::city;
use crate::error::AppError;

pub const CITY_ORDER_MAX: i32 = 9999;
pub const CITY_ORDER_DEFAULT: i32 = 9999;

#[derive(Serialize, utoipa::ToSchema)]
pub struct CityResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "New York")]
    pub name: String,
    #[schema(example = "new-york")]
    pub slug: String,
    pub country_id: Option<i32>,
    pub is_active: bool,
    #[schema(example = 1)]
    pub order: i32,
    pub location: Option<LocationOut>,
    pub image_id: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<city::Model> for CityResponse {
    fn from(m: city::Model) -> Self {
        Self {
            location: LocationOut::from_wkt(m.location.as_deref()),
            id: m.id,
            name: m.name,
            slug: m.slug,
            country_id: m.country_id,
            is_active: m.is_active,
            order: m.order,
            image_id: m.image_id,
            image_url: m.image_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Request body for creating a city.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCityRequest {
    #[schema(example = "New York")]
    pub name: String,
    /// Normalized before storage; derived from `name` when omitted.
    pub slug: Option<String>,
    /// Must reference an existing country.
    #[schema(example = 1)]
    pub country_id: i32,
    /// Default: true.
    pub is_active: Option<bool>,
    /// 0-9999. Default: 9999.
    pub order: Option<i32>,
    pub location: Option<String>,
    pub image_id: Option<i32>,
    pub image_url: Option<String>,
}

/// Partial update. Absent fields are left unchanged; `null` clears nullable ones.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCityRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub country_id: Option<Option<i32>>,
    pub is_active: Option<bool>,
    pub order: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub image_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CityListQuery {
    /// Rows to skip. Default: 0.
    pub skip: Option<u64>,
    /// Rows per page, 1-1000. Default: 100.
    pub limit: Option<u64>,
    pub is_active: Option<bool>,
    pub country_id: Option<i32>,
    /// Case-insensitive match on the name.
    pub search: Option<String>,
}

pub fn validate_create_city(payload: &CreateCityRequest) -> Result<(), AppError> {
    validate_len(&payload.name, "Name", 1, 100)?;
    if let Some(ref slug) = payload.slug {
        validate_len(slug, "Slug", 1, 100)?;
    }
    if let Some(order) = payload.order {
        validate_order(order, 0, CITY_ORDER_MAX)?;
    }
    if let Some(ref location) = payload.location {
        location_to_wkt(location)?;
    }
    validate_optional_len(payload.image_url.as_deref(), "Image URL", 2048)
}

pub fn validate_update_city(payload: &UpdateCityRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.name {
        validate_len(name, "Name", 1, 100)?;
    }
    if let Some(ref slug) = payload.slug {
        validate_len(slug, "Slug", 1, 100)?;
    }
    if let Some(order) = payload.order {
        validate_order(order, 0, CITY_ORDER_MAX)?;
    }
    if let Some(Some(ref location)) = payload.location {
        location_to_wkt(location)?;
    }
    if let Some(ref image_url) = payload.image_url {
        validate_optional_len(image_url.as_deref(), "Image URL", 2048)?;
    }
    Ok(())
}
