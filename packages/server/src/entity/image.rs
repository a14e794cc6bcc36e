use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub filename: String,
    #[sea_orm(column_type = "Text")]
    pub image_url: String,
    /// `image_url` with any legacy host rewritten to the CDN host.
    #[sea_orm(column_type = "Text", nullable)]
    pub premier_image_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub backup_image_url: Option<String>,

    pub file_id: Option<i32>,
    #[sea_orm(belongs_to, from = "file_id", to = "id")]
    pub file: HasOne<super::file::Entity>,

    pub order: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub alt_text: Option<String>,

    pub is_active: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
