use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{access_tokens, html_players, password_tokens, players};

pub mod migrator;
pub mod repositories;

pub use repositories::html_player::NewHtmlPlayer;
pub use repositories::player::{NewPlayer, PlayerChanges};
pub use repositories::user::{NewUser, User, UserChanges};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn access_token_repo(&self) -> repositories::token::AccessTokenRepository {
        repositories::token::AccessTokenRepository::new(self.conn.clone())
    }

    fn password_token_repo(&self) -> repositories::token::PasswordTokenRepository {
        repositories::token::PasswordTokenRepository::new(self.conn.clone())
    }

    fn player_repo(&self) -> repositories::player::PlayerRepository {
        repositories::player::PlayerRepository::new(self.conn.clone())
    }

    fn html_player_repo(&self) -> repositories::html_player::HtmlPlayerRepository {
        repositories::html_player::HtmlPlayerRepository::new(self.conn.clone())
    }

    // Users

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    pub async fn count_users(&self) -> Result<u64> {
        self.user_repo().count().await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn email_taken(&self, email: &str, except_id: Option<i32>) -> Result<bool> {
        self.user_repo().email_taken(email, except_id).await
    }

    pub async fn username_taken(&self, username: &str, except_id: Option<i32>) -> Result<bool> {
        self.user_repo().username_taken(username, except_id).await
    }

    pub async fn create_user(&self, user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(user, security).await
    }

    pub async fn update_user(
        &self,
        id: i32,
        changes: UserChanges,
        security: &SecurityConfig,
    ) -> Result<Option<User>> {
        self.user_repo().update(id, changes, security).await
    }

    pub async fn delete_user(&self, id: i32) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    pub async fn verify_user_password(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password(id, password).await
    }

    pub async fn set_user_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .set_password(id, new_password, security)
            .await
    }

    // Tokens

    pub async fn issue_access_token(
        &self,
        user_id: i32,
        ttl: chrono::Duration,
    ) -> Result<access_tokens::Model> {
        self.access_token_repo().issue(user_id, ttl).await
    }

    pub async fn find_access_token(&self, token: &str) -> Result<Option<access_tokens::Model>> {
        self.access_token_repo().find(token).await
    }

    pub async fn touch_access_token(&self, token: access_tokens::Model) -> Result<()> {
        self.access_token_repo().touch(token).await
    }

    pub async fn revoke_access_token(&self, token: &str) -> Result<bool> {
        self.access_token_repo().revoke(token).await
    }

    pub async fn purge_expired_access_tokens(&self) -> Result<u64> {
        self.access_token_repo().purge_expired().await
    }

    pub async fn create_password_token(&self, user_id: i32) -> Result<password_tokens::Model> {
        self.password_token_repo().create(user_id).await
    }

    pub async fn find_password_token(
        &self,
        token: &str,
    ) -> Result<Option<password_tokens::Model>> {
        self.password_token_repo().find(token).await
    }

    pub async fn delete_password_token(&self, id: i32) -> Result<()> {
        self.password_token_repo().delete(id).await
    }

    // Players

    pub async fn list_players(&self) -> Result<Vec<players::Model>> {
        self.player_repo().list().await
    }

    pub async fn count_players(&self) -> Result<u64> {
        self.player_repo().count().await
    }

    pub async fn get_player(&self, id: i32) -> Result<Option<players::Model>> {
        self.player_repo().get(id).await
    }

    pub async fn create_player(&self, player: NewPlayer) -> Result<players::Model> {
        self.player_repo().create(player).await
    }

    pub async fn update_player(
        &self,
        id: i32,
        changes: PlayerChanges,
    ) -> Result<Option<players::Model>> {
        self.player_repo().update(id, changes).await
    }

    pub async fn delete_player(&self, id: i32) -> Result<bool> {
        self.player_repo().delete(id).await
    }

    // Html players

    pub async fn list_html_players(&self) -> Result<Vec<html_players::Model>> {
        self.html_player_repo().list().await
    }

    pub async fn count_html_players(&self) -> Result<u64> {
        self.html_player_repo().count().await
    }

    pub async fn get_html_player(&self, id: i32) -> Result<Option<html_players::Model>> {
        self.html_player_repo().get(id).await
    }

    pub async fn create_html_player(&self, player: NewHtmlPlayer) -> Result<html_players::Model> {
        self.html_player_repo().create(player).await
    }

    pub async fn save_html_player(
        &self,
        player: html_players::Model,
    ) -> Result<html_players::Model> {
        self.html_player_repo().save(player).await
    }

    pub async fn delete_html_player(&self, id: i32) -> Result<bool> {
        self.html_player_repo().delete(id).await
    }
}
