use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::services::{AuthError, MediaError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failure")]
    Validation(BTreeMap<String, String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Gone(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden() -> Self {
        Self::Forbidden("Access denied".to_string())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized access".to_string())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Single-field 422.
    pub fn invalid_field(field: &str, msg: impl Into<String>) -> Self {
        Self::Validation(BTreeMap::from([(field.to_string(), msg.into())]))
    }

    const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidCredentials(_) => (StatusCode::UNAUTHORIZED, "E_INVALID_CREDENTIALS"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "E_UNAUTHORIZED_ACCESS"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "E_AUTHORIZATION_FAILURE"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "BAD_REQUEST"),
            Self::Gone(_) => (StatusCode::GONE, "TOKEN_EXPIRED"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "E_PAYLOAD_TOO_LARGE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "E_INTERNAL"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, errors) = match self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                ("An internal error occurred".to_string(), None)
            }
            Self::Validation(errors) => ("Validation failure".to_string(), Some(errors)),
            Self::BadRequest(msg)
            | Self::InvalidCredentials(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Gone(msg)
            | Self::PayloadTooLarge(msg) => (msg, None),
        };

        let body = ErrorBody {
            code,
            message,
            status: status.as_u16(),
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => {
                Self::InvalidCredentials("Invalid user credentials".to_string())
            }
            AuthError::WrongPassword => Self::InvalidCredentials(err.to_string()),
            AuthError::Unauthorized => Self::unauthorized(),
            AuthError::Forbidden => Self::forbidden(),
            AuthError::UserNotFound | AuthError::TokenNotFound => Self::NotFound(err.to_string()),
            AuthError::TokenExpired => Self::Gone(err.to_string()),
            AuthError::Validation(msg) => Self::BadRequest(msg),
            AuthError::Database(msg) | AuthError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::InvalidFilename(_) | MediaError::PathTraversal(_) => {
                Self::BadRequest(err.to_string())
            }
            MediaError::Io(e) => Self::Internal(format!("Media IO error: {e}")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_carries_field_errors() {
        let (status, body) = render(ApiError::invalid_field("email", "must be an email")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["status"], 422);
        assert_eq!(body["errors"]["email"], "must be an email");
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let (status, body) = render(ApiError::internal("disk on fire")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "E_INTERNAL");
        assert!(!body["message"].as_str().unwrap().contains("disk"));
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn auth_errors_map_to_codes() {
        let (status, body) = render(AuthError::TokenExpired.into()).await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["code"], "TOKEN_EXPIRED");

        let (status, body) = render(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "E_INVALID_CREDENTIALS");

        let (status, body) = render(ApiError::conflict("email already in use")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert_eq!(body["message"], "email already in use");
    }
}
