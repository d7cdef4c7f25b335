use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::FieldErrors;
use super::{ApiError, ApiJson, AppState, MessageResponse};
use crate::db::User;
use crate::services::{AuthenticatedUser, LoginResult};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// The caller resolved by [`auth_middleware`], available as a request extension.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

impl CurrentUser {
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.0.user
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.0.token
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <token>` naming a live access token.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).ok_or_else(ApiError::unauthorized)?;

    let authenticated = state.auth_service().authenticate(&token).await?;

    tracing::Span::current().record("user_id", authenticated.user.id);
    request.extensions_mut().insert(CurrentUser(authenticated));

    Ok(next.run(request).await)
}

/// Runs after [`auth_middleware`]; rejects non-admin callers.
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|current| current.user().is_admin);

    if !is_admin {
        return Err(ApiError::forbidden());
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResult>), ApiError> {
    let mut errors = FieldErrors::default();
    let email = errors.require("email", payload.email.as_deref());
    let password = errors.require("password", payload.password.as_deref());

    errors.into_result()?;
    let (Some(email), Some(password)) = (email, password) else {
        return Err(ApiError::InvalidCredentials("Invalid user credentials".to_string()));
    };

    let result = state.auth_service().login(email, password).await?;

    Ok((StatusCode::CREATED, Json(result)))
}

/// DELETE /sessions
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth_service().logout(current.token()).await?;

    Ok(Json(MessageResponse::new("Successfully signed out")))
}
