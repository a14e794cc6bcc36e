use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use super::shared::{double_option, validate_len, validate_optional_len, validate_order};
use crate::entity::image;
use crate::error::AppError;

pub const IMAGE_ORDER_MAX: i32 = 9999;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "colosseum-at-dusk.jpg")]
    pub filename: String,
    pub image_url: String,
    /// `image_url` served from the CDN host when it pointed at a legacy host.
    pub premier_image_url: Option<String>,
    pub backup_image_url: Option<String>,
    pub file_id: Option<i32>,
    pub order: i32,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<image::Model> for ImageResponse {
    fn from(m: image::Model) -> Self {
        Self {
            id: m.id,
            filename: m.filename,
            image_url: m.image_url,
            premier_image_url: m.premier_image_url,
            backup_image_url: m.backup_image_url,
            file_id: m.file_id,
            order: m.order,
            description: m.description,
            alt_text: m.alt_text,
            is_active: m.is_active,
            is_deleted: m.is_deleted,
            deleted_at: m.deleted_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Register an image that already lives at a URL.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateImageRequest {
    /// Lowercased with whitespace replaced by `-`.
    #[schema(example = "Colosseum at dusk.jpg")]
    pub filename: String,
    #[schema(example = "https://storage.googleapis.com/staging-luxe.appspot.com/rome/colosseum.jpg")]
    pub image_url: String,
    pub backup_image_url: Option<String>,
    /// At most 1000 characters.
    pub description: Option<String>,
    /// At most 255 characters.
    pub alt_text: Option<String>,
    /// 0-9999. Default: 0.
    #[serde(default)]
    pub order: i32,
    pub file_id: Option<i32>,
}

/// Partial update. Absent fields are left unchanged; `null` clears nullable ones.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateImageRequest {
    pub filename: Option<String>,
    /// Changing the URL also recomputes `premier_image_url`.
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub backup_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub alt_text: Option<Option<String>>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageListQuery {
    /// Rows to skip. Default: 0.
    pub skip: Option<u64>,
    /// Rows per page, 1-1000. Default: 100.
    pub limit: Option<u64>,
    /// Exclude soft-deleted images. Default: true.
    pub active_only: Option<bool>,
}

/// Lowercase, trim and replace whitespace runs with `-`.
pub fn normalize_image_filename(filename: &str) -> String {
    filename
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn validate_common(
    description: Option<&str>,
    alt_text: Option<&str>,
    order: Option<i32>,
) -> Result<(), AppError> {
    validate_optional_len(description, "Description", 1000)?;
    validate_optional_len(alt_text, "Alt text", 255)?;
    if let Some(order) = order {
        validate_order(order, 0, IMAGE_ORDER_MAX)?;
    }
    Ok(())
}

pub fn validate_create_image(payload: &CreateImageRequest) -> Result<(), AppError> {
    validate_len(&payload.filename, "Filename", 1, 255)?;
    if payload.image_url.trim().is_empty() {
        return Err(AppError::Validation("Image URL must not be empty".into()));
    }
    validate_common(
        payload.description.as_deref(),
        payload.alt_text.as_deref(),
        Some(payload.order),
    )
}

pub fn validate_update_image(payload: &UpdateImageRequest) -> Result<(), AppError> {
    if let Some(ref filename) = payload.filename {
        validate_len(filename, "Filename", 1, 255)?;
    }
    if let Some(ref url) = payload.image_url
        && url.trim().is_empty()
    {
        return Err(AppError::Validation("Image URL must not be empty".into()));
    }
    validate_common(
        payload.description.as_ref().and_then(|d| d.as_deref()),
        payload.alt_text.as_ref().and_then(|a| a.as_deref()),
        payload.order,
    )
}
