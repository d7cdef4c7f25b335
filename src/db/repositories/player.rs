use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder, Set,
};

use crate::entities::players;
use crate::models::Schedule;

#[derive(Debug, Clone)]
pub struct NewPlayer {
    pub file_type: String,
    pub title: String,
    pub file_url: String,
    pub duration_ms: i64,
    pub schedule: Schedule,
    pub last_modified: i32,
}

/// Field-wise update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PlayerChanges {
    pub title: Option<String>,
    pub duration_ms: Option<i64>,
    pub schedule: Option<Schedule>,
    pub last_modified: Option<i32>,
}

pub struct PlayerRepository {
    conn: DatabaseConnection,
}

impl PlayerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<players::Model>> {
        players::Entity::find()
            .order_by_asc(players::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list players")
    }

    pub async fn count(&self) -> Result<u64> {
        players::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count players")
    }

    pub async fn get(&self, id: i32) -> Result<Option<players::Model>> {
        players::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query player")
    }

    pub async fn create(&self, player: NewPlayer) -> Result<players::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = players::ActiveModel {
            file_type: Set(player.file_type),
            title: Set(player.title),
            file_url: Set(player.file_url),
            duration_ms: Set(player.duration_ms),
            schedule: Set(player.schedule),
            last_modified: Set(player.last_modified),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert player")
    }

    pub async fn update(&self, id: i32, changes: PlayerChanges) -> Result<Option<players::Model>> {
        let Some(player) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: players::ActiveModel = player.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(duration_ms) = changes.duration_ms {
            active.duration_ms = Set(duration_ms);
        }
        if let Some(schedule) = changes.schedule {
            active.schedule = Set(schedule);
        }
        if let Some(user_id) = changes.last_modified {
            active.last_modified = Set(user_id);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update player")?;

        Ok(Some(model))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = players::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete player")?;

        Ok(result.rows_affected > 0)
    }
}
