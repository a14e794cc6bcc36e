use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, database, seed};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let config = AppConfig::load()?;
    let db = database::init_db(&config.database).await?;
    info!("Connected to database");

    seed::ensure_indexes(&db).await?;
    match seed::ensure_admin(&db, &config.bootstrap).await {
        Ok(true) => info!("Bootstrap administrator ready"),
        Ok(false) => {}
        Err(e) => warn!("Failed to create bootstrap administrator: {e}"),
    }

    let object_store = match common::storage::build_object_store(&config.storage) {
        Ok(Some(store)) => {
            info!(provider = store.provider(), "Object storage configured");
            Some(store)
        }
        Ok(None) => {
            warn!("No storage provider configured; uploads will be rejected");
            None
        }
        Err(e) => {
            warn!("Object storage unavailable, uploads will be rejected: {e}");
            None
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        object_store,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{addr}");
    info!("API docs available at http://{addr}/swagger-ui");
    axum::serve(listener, app).await?;

    Ok(())
}
