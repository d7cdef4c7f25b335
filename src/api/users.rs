use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use sea_orm::{DbErr, SqlErr};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{FieldErrors, USER_PASSWORD_MIN_LEN};
use super::{ApiError, ApiJson, ApiPath, AppState, CurrentUser, UserDto, UserEnvelope, UsersEnvelope};
use crate::db::{NewUser, UserChanges};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A unique index firing after the pre-checks (concurrent insert) is still a 409.
fn map_write_error(err: anyhow::Error) -> ApiError {
    if let Some(db_err) = err.downcast_ref::<DbErr>()
        && matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    {
        return ApiError::conflict("email or username already in use");
    }
    err.into()
}

async fn ensure_unique(
    state: &AppState,
    email: Option<&str>,
    username: Option<&str>,
    except_id: Option<i32>,
) -> Result<(), ApiError> {
    if let Some(email) = email
        && state.store().email_taken(email, except_id).await?
    {
        return Err(ApiError::conflict("email already in use"));
    }

    if let Some(username) = username
        && state.store().username_taken(username, except_id).await?
    {
        return Err(ApiError::conflict("username already in use"));
    }

    Ok(())
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    let mut errors = FieldErrors::default();
    let username = errors.require("username", payload.username.as_deref());
    let email = errors.require("email", payload.email.as_deref());
    let password = errors.require("password", payload.password.as_deref());
    if let Some(email) = email {
        errors.check_email("email", email);
    }
    if let Some(password) = password {
        errors.check_min_len("password", password, USER_PASSWORD_MIN_LEN);
    }
    errors.into_result()?;

    let (Some(username), Some(email), Some(password)) = (username, email, password) else {
        return Err(ApiError::bad_request("username, email and password are required"));
    };

    ensure_unique(&state, Some(email), Some(username), None).await?;

    let user = state
        .store()
        .create_user(
            NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                is_admin: payload.is_admin.unwrap_or(false),
            },
            &state.config().security,
        )
        .await
        .map_err(map_write_error)?;

    tracing::info!(user_id = user.id, username = %user.username, "User created");

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            user: UserDto::from(user),
        }),
    ))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersEnvelope>, ApiError> {
    let users = state.store().list_users().await?;

    Ok(Json(UsersEnvelope {
        users: users.into_iter().map(UserDto::from).collect(),
    }))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(UserEnvelope {
        user: UserDto::from(user),
    }))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let mut errors = FieldErrors::default();
    if let Some(username) = payload.username.as_deref() {
        errors.require("username", Some(username));
    }
    if let Some(email) = payload.email.as_deref() {
        errors.check_email("email", email);
    }
    if let Some(password) = payload.password.as_deref() {
        errors.check_min_len("password", password, USER_PASSWORD_MIN_LEN);
    }
    errors.into_result()?;

    let target = state
        .store()
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    if current.user().id != target.id {
        return Err(ApiError::forbidden());
    }

    ensure_unique(
        &state,
        payload.email.as_deref(),
        payload.username.as_deref(),
        Some(target.id),
    )
    .await?;

    let user = state
        .store()
        .update_user(
            target.id,
            UserChanges {
                username: payload.username,
                email: payload.email,
                password: payload.password,
            },
            &state.config().security,
        )
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(UserEnvelope {
        user: UserDto::from(user),
    }))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    if !state.store().delete_user(id).await? {
        return Err(ApiError::not_found("User", id));
    }

    tracing::info!(user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
