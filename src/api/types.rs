use axum::extract::FromRequest;
use axum::extract::FromRequestParts;
use serde::Serialize;

use super::ApiError;
use crate::db::User;
use crate::entities::{html_players, players};
use crate::models::Schedule;

/// `axum::Json` with rejections rendered as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections rendered as [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub const fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct UsersEnvelope {
    pub users: Vec<UserDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub id: i32,
    pub file_type: String,
    pub title: String,
    pub file_url: String,
    pub duration_ms: i64,
    pub schedule: Schedule,
    pub last_modified: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl From<players::Model> for PlayerDto {
    fn from(model: players::Model) -> Self {
        Self {
            id: model.id,
            file_type: model.file_type,
            title: model.title,
            file_url: model.file_url,
            duration_ms: model.duration_ms,
            schedule: model.schedule,
            last_modified: model.last_modified,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlPlayerDto {
    pub id: i32,
    pub file_type: String,
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
    pub created_at: String,
    pub updated_at: String,
}

impl From<html_players::Model> for HtmlPlayerDto {
    fn from(model: html_players::Model) -> Self {
        Self {
            id: model.id,
            file_type: model.file_type,
            html_url: model.html_url,
            title: model.title,
            body_html: model.body_html,
            bg_color: model.bg_color,
            text_color: model.text_color,
            font_family: model.font_family,
            font_size_px: model.font_size_px,
            text_align: model.text_align,
            padding_px: model.padding_px,
            max_width_px: model.max_width_px,
            schedule: model.schedule,
            last_modified: model.last_modified,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Response for endpoints that write a media file and a row together.
#[derive(Debug, Serialize)]
pub struct FileCreated<T> {
    pub ok: bool,
    pub file: String,
    pub player: T,
}

impl<T> FileCreated<T> {
    pub const fn new(file: String, player: T) -> Self {
        Self {
            ok: true,
            file,
            player,
        }
    }
}
