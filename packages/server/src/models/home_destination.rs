use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use super::shared::validate_len;
use crate::entity::home_destination;
use crate::error::AppError;

pub const HOME_ORDER_MIN: i32 = 1;
pub const HOME_ORDER_MAX: i32 = 999;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeDestinationResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "kyoto")]
    pub city: String,
    #[schema(example = 1)]
    pub order: i32,
    pub is_active: bool,
    /// ID of the uploaded file.
    pub image: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<home_destination::Model> for HomeDestinationResponse {
    fn from(m: home_destination::Model) -> Self {
        Self {
            id: m.id,
            city: m.city,
            order: m.order,
            is_active: m.is_active,
            image: m.image,
            image_url: m.image_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Payload of the home destination list endpoint.
#[derive(Serialize, utoipa::ToSchema)]
pub struct HomeDestinationList {
    pub destinations: Vec<HomeDestinationResponse>,
    /// Rows matching the filters.
    pub total: u64,
    /// Active rows in the whole table.
    pub active_count: u64,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HomeDestinationListQuery {
    /// Rows to skip. Default: 0.
    pub skip: Option<u64>,
    /// Rows per page, 1-1000. Default: 100.
    pub limit: Option<u64>,
    /// Only active destinations. Default: true.
    pub active_only: Option<bool>,
    /// Case-insensitive match on the city.
    pub search: Option<String>,
}

/// Text fields of the multipart create/update form.
#[derive(Debug, Default, PartialEq)]
pub struct HomeDestinationFields {
    pub city: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

pub fn validate_home_order(order: i32) -> Result<(), AppError> {
    if !(HOME_ORDER_MIN..=HOME_ORDER_MAX).contains(&order) {
        return Err(AppError::bad_request(
            "INVALID_ORDER",
            format!("Order must be between {HOME_ORDER_MIN} and {HOME_ORDER_MAX}"),
        ));
    }
    Ok(())
}

pub fn validate_home_fields(fields: &HomeDestinationFields) -> Result<(), AppError> {
    if let Some(ref city) = fields.city {
        validate_len(city, "City", 1, 100)?;
    }
    if let Some(order) = fields.order {
        validate_home_order(order)?;
    }
    Ok(())
}
