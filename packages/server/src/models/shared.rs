use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;
use crate::utils::location::{GeoPoint, parse_location};

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 1000;

/// Offset window of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Clamp raw `skip`/`limit` query values. `limit` is forced into 1..=1000.
    pub fn new(skip: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            skip: skip.unwrap_or(0),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// 1-based page number derived from the window.
    pub fn page(&self) -> u64 {
        self.skip / self.limit + 1
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Lowercased `%term%` pattern, or `None` for a blank search.
pub fn like_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|t| !t.is_empty())?;
    Some(format!("%{}%", escape_like(&term.to_lowercase())))
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a trimmed string's length in characters.
pub fn validate_len(value: &str, field: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be {min}-{max} characters"
        )));
    }
    Ok(())
}

pub fn validate_optional_len(
    value: Option<&str>,
    field: &str,
    max: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max
    {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Validate a display order within `min..=max`.
pub fn validate_order(order: i32, min: i32, max: i32) -> Result<(), AppError> {
    if !(min..=max).contains(&order) {
        return Err(AppError::Validation(format!(
            "Order must be between {min} and {max}"
        )));
    }
    Ok(())
}

/// Parse a location string and return its WKT form.
pub fn location_to_wkt(raw: &str) -> Result<String, AppError> {
    if raw.chars().count() > 255 {
        return Err(AppError::Validation(
            "Location must be at most 255 characters".into(),
        ));
    }
    parse_location(raw).map(GeoPoint::to_wkt).ok_or_else(|| {
        AppError::Validation(
            "Location must be coordinates such as \"40.71, -74.00\" or POINT(lng lat)".into(),
        )
    })
}

/// Coordinate pair as returned to clients.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, utoipa::ToSchema)]
pub struct LocationOut {
    #[schema(example = 40.7128)]
    pub lat: f64,
    #[schema(example = -74.006)]
    pub lng: f64,
}

impl LocationOut {
    pub fn from_wkt(wkt: Option<&str>) -> Option<Self> {
        wkt.and_then(GeoPoint::from_wkt)
            .map(|p| Self { lat: p.lat, lng: p.lng })
    }
}

/// Parse a multipart text value as a form boolean.
pub fn parse_form_bool(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AppError::Validation(format!(
            "'{other}' is not a valid boolean"
        ))),
    }
}

pub fn parse_form_int(raw: &str, field: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{field} must be an integer")))
}
