use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};

use crate::entities::html_players;
use crate::models::Schedule;

#[derive(Debug, Clone)]
pub struct NewHtmlPlayer {
    pub html_url: String,
    pub title: String,
    pub body_html: String,
    pub bg_color: String,
    pub text_color: String,
    pub font_family: String,
    pub font_size_px: i32,
    pub text_align: String,
    pub padding_px: i32,
    pub max_width_px: i32,
    pub schedule: Schedule,
    pub last_modified: i32,
}

impl NewHtmlPlayer {
    /// Copies every presentation field of `source` into a new row definition.
    #[must_use]
    pub fn from_existing(source: &html_players::Model, title: String, html_url: String) -> Self {
        Self {
            html_url,
            title,
            body_html: source.body_html.clone(),
            bg_color: source.bg_color.clone(),
            text_color: source.text_color.clone(),
            font_family: source.font_family.clone(),
            font_size_px: source.font_size_px,
            text_align: source.text_align.clone(),
            padding_px: source.padding_px,
            max_width_px: source.max_width_px,
            schedule: source.schedule.clone(),
            last_modified: source.last_modified,
        }
    }
}

pub struct HtmlPlayerRepository {
    conn: DatabaseConnection,
}

impl HtmlPlayerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<html_players::Model>> {
        html_players::Entity::find()
            .order_by_asc(html_players::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list html players")
    }

    pub async fn count(&self) -> Result<u64> {
        html_players::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count html players")
    }

    pub async fn get(&self, id: i32) -> Result<Option<html_players::Model>> {
        html_players::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query html player")
    }

    pub async fn create(&self, player: NewHtmlPlayer) -> Result<html_players::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = html_players::ActiveModel {
            file_type: Set("html".to_string()),
            html_url: Set(player.html_url),
            title: Set(player.title),
            body_html: Set(player.body_html),
            bg_color: Set(player.bg_color),
            text_color: Set(player.text_color),
            font_family: Set(player.font_family),
            font_size_px: Set(player.font_size_px),
            text_align: Set(player.text_align),
            padding_px: Set(player.padding_px),
            max_width_px: Set(player.max_width_px),
            schedule: Set(player.schedule),
            last_modified: Set(player.last_modified),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert html player")
    }

    /// Persists an already-merged model, bumping `updated_at`.
    pub async fn save(&self, model: html_players::Model) -> Result<html_players::Model> {
        let mut active: html_players::ActiveModel = model.clone().into();
        active.title = Set(model.title);
        active.body_html = Set(model.body_html);
        active.bg_color = Set(model.bg_color);
        active.text_color = Set(model.text_color);
        active.font_family = Set(model.font_family);
        active.font_size_px = Set(model.font_size_px);
        active.text_align = Set(model.text_align);
        active.padding_px = Set(model.padding_px);
        active.max_width_px = Set(model.max_width_px);
        active.schedule = Set(model.schedule);
        active.last_modified = Set(model.last_modified);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update html player")
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = html_players::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete html player")?;

        Ok(result.rows_affected > 0)
    }
}
