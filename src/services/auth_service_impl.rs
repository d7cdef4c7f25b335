//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, AuthenticatedUser, LoginResult};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn check_new_password(
        &self,
        new_password: &str,
        confirm_password: Option<&str>,
    ) -> Result<(), AuthError> {
        if new_password.chars().count() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters long",
                self.security.min_password_length
            )));
        }

        if confirm_password.is_some_and(|confirm| confirm != new_password) {
            return Err(AuthError::Validation("Passwords do not match".to_string()));
        }

        Ok(())
    }
}

fn parse_stamp(stamp: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::parse_from_rfc3339(stamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AuthError::Internal(format!("Invalid timestamp {stamp:?}: {e}")))
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let user = self
            .store
            .verify_credentials(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self
            .store
            .issue_access_token(
                user.id,
                Duration::minutes(self.security.access_token_ttl_minutes),
            )
            .await?;

        info!(user_id = user.id, "User signed in");

        Ok(LoginResult {
            id: user.id,
            email: user.email,
            username: user.username,
            token: token.token,
        })
    }

    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let record = self
            .store
            .find_access_token(token)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if parse_stamp(&record.expires_at)? <= Utc::now() {
            self.store.revoke_access_token(token).await?;
            return Err(AuthError::Unauthorized);
        }

        let user = self
            .store
            .get_user(record.user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let token = record.token.clone();
        if let Err(e) = self.store.touch_access_token(record).await {
            warn!(user_id = user.id, error = %e, "Failed to record token use");
        }

        Ok(AuthenticatedUser { user, token })
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.store.revoke_access_token(token).await?;
        Ok(())
    }

    async fn change_password(
        &self,
        actor: &User,
        target_id: i32,
        old_password: &str,
        new_password: &str,
        confirm_password: Option<&str>,
    ) -> Result<(), AuthError> {
        let target = self
            .store
            .get_user(target_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if actor.id != target.id {
            return Err(AuthError::Forbidden);
        }

        self.check_new_password(new_password, confirm_password)?;

        if !self
            .store
            .verify_user_password(target.id, old_password)
            .await?
        {
            return Err(AuthError::WrongPassword);
        }

        self.store
            .set_user_password(target.id, new_password, &self.security)
            .await?;

        info!(user_id = target.id, "Password changed");
        Ok(())
    }

    async fn admin_change_password(
        &self,
        target_id: i32,
        new_password: &str,
        confirm_password: Option<&str>,
    ) -> Result<(), AuthError> {
        let target = self
            .store
            .get_user(target_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.check_new_password(new_password, confirm_password)?;

        self.store
            .set_user_password(target.id, new_password, &self.security)
            .await?;

        info!(user_id = target.id, "Password changed by admin");
        Ok(())
    }

    async fn forgot_password(&self, email: &str, reset_url: &str) -> Result<String, AuthError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let record = self.store.create_password_token(user.id).await?;

        // No mailer: the link goes to the log for the operator to relay.
        info!(
            user_id = user.id,
            link = %format!("{reset_url}?token={}", record.token),
            "Password reset requested"
        );

        Ok(record.token)
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let record = self
            .store
            .find_password_token(token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let age = Utc::now() - parse_stamp(&record.created_at)?;
        if age > Duration::minutes(self.security.reset_token_ttl_minutes) {
            self.store.delete_password_token(record.id).await?;
            return Err(AuthError::TokenExpired);
        }

        self.check_new_password(new_password, None)?;

        self.store
            .set_user_password(record.user_id, new_password, &self.security)
            .await?;
        self.store.delete_password_token(record.id).await?;

        info!(user_id = record.user_id, "Password reset");
        Ok(())
    }

    async fn purge_expired_tokens(&self) -> Result<u64, AuthError> {
        Ok(self.store.purge_expired_access_tokens().await?)
    }
}
