use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{instrument, warn};

use crate::models::envelope::ApiResponse;
use crate::models::health::{HealthStatus, ServiceInfo};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    operation_id = "serviceInfo",
    summary = "Service information",
    responses((status = 200, description = "Service name and version", body = ApiResponse<ServiceInfo>)),
)]
pub async fn root() -> Json<ApiResponse<ServiceInfo>> {
    ApiResponse::ok(
        ServiceInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            docs: "/swagger-ui",
        },
        "Voyage API is running",
    )
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "healthCheck",
    summary = "Liveness and database connectivity",
    responses(
        (status = 200, description = "Healthy", body = ApiResponse<HealthStatus>),
        (status = 503, description = "Database unreachable", body = ApiResponse<HealthStatus>),
    ),
)]
#[instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthStatus>>) {
    let storage = state.object_store.as_ref().map(|s| s.provider());
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            ApiResponse::ok(
                HealthStatus {
                    status: "healthy",
                    database: "connected",
                    storage,
                },
                "Service healthy",
            ),
        ),
        Err(e) => {
            warn!("Health check database ping failed: {e}");
            let mut body = ApiResponse::ok(
                HealthStatus {
                    status: "unhealthy",
                    database: "unreachable",
                    storage,
                },
                "Database unreachable",
            );
            body.status = StatusCode::SERVICE_UNAVAILABLE.as_u16();
            (StatusCode::SERVICE_UNAVAILABLE, body)
        }
    }
}
