use sea_orm::entity::prelude::*;

use crate::models::Schedule;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "html_players")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Always `html`
    pub file_type: String,

    pub html_url: String,

    pub title: String,

    /// Sanitized notice body as stored; the page on disk is regenerated from it.
    #[sea_orm(column_type = "Text")]
    pub body_html: String,

    pub bg_color: String,

    pub text_color: String,

    pub font_family: String,

    pub font_size_px: i32,

    pub text_align: String,

    pub padding_px: i32,

    pub max_width_px: i32,

    #[sea_orm(column_type = "Json")]
    pub schedule: Schedule,

    pub last_modified: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
