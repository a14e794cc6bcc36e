use std::sync::Arc;

use common::storage::ObjectStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    /// `None` when no storage provider is configured; uploads then fail with 503.
    pub object_store: Option<Arc<dyn ObjectStore>>,
}
