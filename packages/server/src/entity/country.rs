use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "countries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    /// Uppercase ISO 3166 alpha-2 or alpha-3 code.
    #[sea_orm(unique)]
    pub country_code: String,
    /// WKT `POINT(<lng> <lat>)`.
    pub location: Option<String>,

    pub image_id: Option<i32>,
    #[sea_orm(belongs_to, from = "image_id", to = "id")]
    pub image: HasOne<super::image::Entity>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,

    /// Shown in the destination menu.
    pub showon_destmenu: bool,

    #[sea_orm(has_many)]
    pub cities: HasMany<super::city::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
