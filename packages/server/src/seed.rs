use chrono::Utc;
use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::config::BootstrapConfig;
use crate::domain::build_user;
use crate::entity::{city, file, image, user};
use crate::utils::hash;

/// Ensure required database indexes exist.
///
/// Schema sync only creates single-column unique indexes, so the composite
/// listing indexes are created here on startup.
pub async fn ensure_indexes<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    // Cities of a country in display order.
    let cities = Index::create()
        .if_not_exists()
        .name(CITIES_IDX)
        .table(city::Entity)
        .col(city::Column::CountryId)
        .col(city::Column::Order)
        .to_owned();

    // Active image listing.
    let images = Index::create()
        .if_not_exists()
        .name(IMAGES_IDX)
        .table(image::Entity)
        .col(image::Column::IsDeleted)
        .col(image::Column::Order)
        .to_owned();

    let files = Index::create()
        .if_not_exists()
        .name(FILES_IDX)
        .table(file::Entity)
        .col(file::Column::IsDeleted)
        .col(file::Column::CreatedAt)
        .to_owned();

    for (name, stmt) in [(CITIES_IDX, cities), (IMAGES_IDX, images), (FILES_IDX, files)] {
        create_index(db, name, stmt).await;
    }
    Ok(())
}

const CITIES_IDX: &str = "idx_cities_country_order";
const IMAGES_IDX: &str = "idx_images_deleted_order";
const FILES_IDX: &str = "idx_files_deleted_created";

async fn create_index<C: ConnectionTrait>(db: &C, name: &str, stmt: IndexCreateStatement) {
    match db.execute_unprepared(&stmt.to_string(PostgresQueryBuilder)).await {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => warn!("Failed to create index {name}: {e}"),
    }
}

/// Create the bootstrap administrator if configured and not yet present.
///
/// Returns `true` when a new account was inserted.
pub async fn ensure_admin<C: ConnectionTrait>(
    db: &C,
    cfg: &BootstrapConfig,
) -> Result<bool, DbErr> {
    let (Some(email), Some(password)) = (cfg.admin_email.as_deref(), cfg.admin_password.as_deref())
    else {
        return Ok(false);
    };

    let username = cfg
        .admin_username
        .as_deref()
        .or_else(|| email.split('@').next())
        .unwrap_or("admin");

    let hashed = hash::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Failed to hash bootstrap password: {e}")))?;
    let admin = build_user(email, username, hashed, true, true, Utc::now());

    let result = user::Entity::insert(admin)
        .on_conflict(OnConflict::column(user::Column::Email).do_nothing().to_owned())
        .exec_without_returning(db)
        .await;

    match result {
        Ok(0) | Err(DbErr::RecordNotInserted) => Ok(false),
        Ok(_) => {
            info!(email, "Created bootstrap administrator");
            Ok(true)
        }
        Err(e) => Err(e),
    }
}
