use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::FieldErrors;
use super::{ApiError, ApiJson, ApiPath, AppState, CurrentUser, MessageResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminChangePasswordRequest {
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
    pub reset_password_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
}

/// POST /change-password/{id}
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = FieldErrors::default();
    let old_password = errors.require("oldPassword", payload.old_password.as_deref());
    let new_password = errors.require("newPassword", payload.new_password.as_deref());
    errors.into_result()?;

    let (Some(old_password), Some(new_password)) = (old_password, new_password) else {
        return Err(ApiError::bad_request("oldPassword and newPassword are required"));
    };

    state
        .auth_service()
        .change_password(
            current.user(),
            id,
            old_password,
            new_password,
            payload.confirm_password.as_deref(),
        )
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// PUT /change-password/admin/{id}
pub async fn admin_change_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<AdminChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = FieldErrors::default();
    let new_password = errors.require("newPassword", payload.new_password.as_deref());
    errors.into_result()?;

    let Some(new_password) = new_password else {
        return Err(ApiError::bad_request("newPassword is required"));
    };

    state
        .auth_service()
        .admin_change_password(id, new_password, payload.confirm_password.as_deref())
        .await?;

    tracing::info!(admin_id = current.user().id, user_id = id, "Admin changed user password");

    Ok(Json(MessageResponse::new(
        "User password has been changed by admin",
    )))
}

/// POST /forgot-password
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = FieldErrors::default();
    let email = errors.require("email", payload.email.as_deref());
    let reset_url = errors.require("resetPasswordUrl", payload.reset_password_url.as_deref());
    if let Some(email) = email {
        errors.check_email("email", email);
    }
    if let Some(reset_url) = reset_url
        && url::Url::parse(reset_url).is_err()
    {
        errors.add("resetPasswordUrl", "The resetPasswordUrl field must be a valid URL");
    }
    errors.into_result()?;

    let (Some(email), Some(reset_url)) = (email, reset_url) else {
        return Err(ApiError::bad_request("email and resetPasswordUrl are required"));
    };

    state
        .auth_service()
        .forgot_password(email, reset_url)
        .await?;

    Ok(Json(MessageResponse::new(
        "Password reset instructions have been issued",
    )))
}

/// POST /reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = FieldErrors::default();
    let token = errors.require("token", payload.token.as_deref());
    let new_password = errors.require("newPassword", payload.new_password.as_deref());
    errors.into_result()?;

    let (Some(token), Some(new_password)) = (token, new_password) else {
        return Err(ApiError::bad_request("token and newPassword are required"));
    };

    state
        .auth_service()
        .reset_password(token, new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password has been reset")))
}
