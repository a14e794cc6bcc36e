use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ServiceInfo {
    #[schema(example = "voyage-server")]
    pub name: &'static str,
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    #[schema(example = "/swagger-ui")]
    pub docs: &'static str,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthStatus {
    #[schema(example = "healthy")]
    pub status: &'static str,
    #[schema(example = "connected")]
    pub database: &'static str,
    /// Active object storage provider, if any.
    #[schema(example = "gcp")]
    pub storage: Option<&'static str>,
}
