use anyhow::{Context, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::user::generate_token;
use crate::entities::{access_tokens, password_tokens};

// Fixed-width UTC stamps so expiry columns compare correctly as text.
fn expiry_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub struct AccessTokenRepository {
    conn: DatabaseConnection,
}

impl AccessTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issues a new bearer token for `user_id` valid for `ttl`.
    pub async fn issue(&self, user_id: i32, ttl: Duration) -> Result<access_tokens::Model> {
        let now = Utc::now();

        let active = access_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(generate_token()),
            expires_at: Set(expiry_stamp(now + ttl)),
            last_used_at: Set(None),
            created_at: Set(now.to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert access token")
    }

    pub async fn find(&self, token: &str) -> Result<Option<access_tokens::Model>> {
        access_tokens::Entity::find()
            .filter(access_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query access token")
    }

    pub async fn touch(&self, model: access_tokens::Model) -> Result<()> {
        let mut active: access_tokens::ActiveModel = model.into();
        active.last_used_at = Set(Some(Utc::now().to_rfc3339()));
        active.update(&self.conn).await?;
        Ok(())
    }

    /// Returns true when a token was deleted.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let result = access_tokens::Entity::delete_many()
            .filter(access_tokens::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete access token")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn purge_expired(&self) -> Result<u64> {
        let result = access_tokens::Entity::delete_many()
            .filter(access_tokens::Column::ExpiresAt.lt(expiry_stamp(Utc::now())))
            .exec(&self.conn)
            .await
            .context("Failed to purge expired access tokens")?;

        Ok(result.rows_affected)
    }
}

pub struct PasswordTokenRepository {
    conn: DatabaseConnection,
}

impl PasswordTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, user_id: i32) -> Result<password_tokens::Model> {
        let now = Utc::now().to_rfc3339();

        let active = password_tokens::ActiveModel {
            token: Set(generate_token()),
            user_id: Set(user_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert password token")
    }

    pub async fn find(&self, token: &str) -> Result<Option<password_tokens::Model>> {
        password_tokens::Entity::find()
            .filter(password_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query password token")
    }

    pub async fn delete(&self, id: i32) -> Result<()> {
        password_tokens::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete password token")?;
        Ok(())
    }
}
