use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata for a blob uploaded to object storage. Never hard-deleted.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `<32 hex>-<sanitized stem>`.
    #[sea_orm(unique)]
    pub identifier: String,
    /// Sanitized original filename.
    pub filename: String,
    /// MIME type detected from the leading bytes.
    pub content_type: String,
    pub size: i64,
    /// Object key inside the bucket.
    pub blob_name: String,
    pub public_url: String,
    /// Store that holds the blob (`aws`, `gcp`, ...).
    pub provider: String,

    pub is_deleted: bool,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
