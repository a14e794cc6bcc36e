use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Error envelope returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// HTTP status code, repeated in the body.
    #[schema(example = 400)]
    pub status: u16,
    /// Human-readable error description.
    #[schema(example = "Order must be between 1 and 999")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Machine-readable error code, e.g. `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `INACTIVE_USER`,
    /// `PERMISSION_DENIED`, `NOT_FOUND`, `COUNTRY_NOT_FOUND`,
    /// `CITY_SLUG_EXISTS`, `ORDER_EXISTS`, `UNSUPPORTED_FILE_TYPE`,
    /// `STORAGE_UNAVAILABLE`, `STORAGE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub error_code: &'static str,
    /// Extra structured context (e.g. the conflicting field).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// 400 with a resource-specific code (e.g. `COUNTRY_NOT_FOUND`).
    BadRequest {
        code: &'static str,
        message: String,
    },
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    InactiveUser,
    PermissionDenied,
    NotFound(String),
    Conflict {
        code: &'static str,
        message: String,
        details: Option<serde_json::Value>,
    },
    UnsupportedFileType(String),
    StorageUnavailable,
    Storage(String),
    Internal(String),
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Conflict naming the offending field and value in `details`.
    pub fn conflict_on(
        code: &'static str,
        message: impl Into<String>,
        field: &str,
        value: impl Serialize,
    ) -> Self {
        let mut details = serde_json::Map::new();
        details.insert(
            field.to_string(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        AppError::Conflict {
            code,
            message: message.into(),
            details: Some(serde_json::Value::Object(details)),
        }
    }

    fn status_and_body(self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, code, message, None)
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_MISSING",
                "Authentication required".into(),
                None,
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "TOKEN_INVALID",
                "Invalid or expired token".into(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Incorrect email or password".into(),
                None,
            ),
            AppError::InactiveUser => (
                StatusCode::UNAUTHORIZED,
                "INACTIVE_USER",
                "User account is inactive".into(),
                None,
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Insufficient permissions".into(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            AppError::Conflict {
                code,
                message,
                details,
            } => (StatusCode::CONFLICT, code, message, details),
            AppError::UnsupportedFileType(msg) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE_TYPE", msg, None)
            }
            AppError::StorageUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_UNAVAILABLE",
                "Object storage is not configured".into(),
                None,
            ),
            AppError::Storage(detail) => {
                tracing::error!("Storage error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "Failed to store the uploaded file".into(),
                    None,
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An unexpected error occurred".into(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = self.status_and_body();
        let body = ErrorBody {
            status: status.as_u16(),
            message,
            timestamp: Utc::now(),
            error_code,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotConfigured(detail) => {
                tracing::warn!("Object storage unavailable: {detail}");
                AppError::StorageUnavailable
            }
            StorageError::NotFound(name) => {
                AppError::NotFound(format!("Stored object '{name}' not found"))
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}
