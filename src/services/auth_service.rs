//! Domain service for authentication.
//!
//! Handles login, bearer token checks, password changes and password resets.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Not allowed to act on this user")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("Token not found")]
    TokenNotFound,

    #[error("Token has expired")]
    TokenExpired,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// Successful login: the user and a freshly issued bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub token: String,
}

/// A user resolved from a bearer token, plus that token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the email is unknown or
    /// the password does not match.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves a bearer token. Expired tokens are deleted and rejected.
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;

    /// Revokes a single token.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Self-service password change. `actor` must be the target user.
    async fn change_password(
        &self,
        actor: &User,
        target_id: i32,
        old_password: &str,
        new_password: &str,
        confirm_password: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Password change performed by an administrator; no old password.
    async fn admin_change_password(
        &self,
        target_id: i32,
        new_password: &str,
        confirm_password: Option<&str>,
    ) -> Result<(), AuthError>;

    /// Creates a reset token for `email` and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UserNotFound`] for an unknown email.
    async fn forgot_password(&self, email: &str, reset_url: &str) -> Result<String, AuthError>;

    /// Consumes a reset token and sets the new password.
    ///
    /// # Errors
    ///
    /// [`AuthError::TokenNotFound`] for an unknown token,
    /// [`AuthError::TokenExpired`] once the token outlived its TTL.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;

    /// Deletes expired access tokens and returns how many were removed.
    async fn purge_expired_tokens(&self) -> Result<u64, AuthError>;
}
