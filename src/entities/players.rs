use sea_orm::entity::prelude::*;

use crate::models::Schedule;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "players")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// `image` or `video`
    pub file_type: String,

    pub title: String,

    /// Public URL of the media file, always `/media/<filename>`
    pub file_url: String,

    pub duration_ms: i64,

    #[sea_orm(column_type = "Json")]
    pub schedule: Schedule,

    /// Id of the user who last touched the row; 0 when unknown.
    pub last_modified: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
