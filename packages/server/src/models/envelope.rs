use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::shared::PageWindow;

/// Success envelope wrapping a single payload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// HTTP status code, repeated in the body.
    #[schema(example = 200)]
    pub status: u16,
    #[schema(example = "Success")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: T,
    /// ID of the created resource (create responses only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<i32>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            timestamp: Utc::now(),
            data,
            resource_id: None,
        })
    }

    pub fn created(data: T, resource_id: i32, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                status: StatusCode::CREATED.as_u16(),
                message: message.into(),
                timestamp: Utc::now(),
                data,
                resource_id: Some(resource_id),
            }),
        )
    }
}

/// Success envelope for paginated lists.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ListResponse<T> {
    #[schema(example = 200)]
    pub status: u16,
    #[schema(example = "Success")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: Vec<T>,
    /// Total matching rows across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// 1-based page number (`skip / limit + 1`).
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 100)]
    pub limit: u64,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, total: u64, window: PageWindow, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: StatusCode::OK.as_u16(),
            message: message.into(),
            timestamp: Utc::now(),
            data,
            total,
            page: window.page(),
            limit: window.limit,
        })
    }
}
