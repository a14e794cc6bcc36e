pub mod auth;
pub mod city;
pub mod country;
pub mod health;
pub mod home_destination;
pub mod image;
pub mod storage;
pub mod user;

use sea_orm::{DbErr, SqlErr};

use crate::error::AppError;

/// Map a unique-constraint violation to `conflict`, anything else to a DB error.
///
/// Pre-checks give the friendly error; this catches the race between the
/// pre-check and the write.
pub(crate) fn unique_violation(err: DbErr, conflict: impl FnOnce() -> AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(%detail, "Unique constraint caught on write");
            conflict()
        }
        _ => AppError::from(err),
    }
}

/// Map a foreign-key violation on delete to a 409 naming the resource.
pub(crate) fn still_referenced(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::conflict(
            "RESOURCE_IN_USE",
            format!("{what} is still referenced by other records"),
        ),
        _ => AppError::from(err),
    }
}
