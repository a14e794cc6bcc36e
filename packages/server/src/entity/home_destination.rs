use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "home_page_destinations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stored lowercased.
    pub city: String,
    /// Position on the home page, 1-999.
    #[sea_orm(unique)]
    pub order: i32,
    pub is_active: bool,

    /// Uploaded file backing the card image.
    pub image: Option<i32>,
    #[sea_orm(belongs_to, from = "image", to = "id")]
    pub file: HasOne<super::file::Entity>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
