use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::FieldErrors;
use super::{ApiError, ApiJson, AppState, OkResponse};
use crate::models::{DefaultsUpdate, Manifest, ManifestDefaults, ManifestOverride};

#[derive(Debug, Serialize)]
pub struct DefaultsResponse {
    pub ok: bool,
    pub defaults: ManifestDefaults,
}

#[derive(Debug, Deserialize)]
pub struct OverrideQuery {
    pub src: Option<String>,
}

/// GET /manifest
pub async fn get_manifest(State(state): State<Arc<AppState>>) -> Json<Manifest> {
    Json(state.manifest().read().await)
}

/// POST /defaults
pub async fn set_defaults(
    State(state): State<Arc<AppState>>,
    ApiJson(update): ApiJson<DefaultsUpdate>,
) -> Result<Json<DefaultsResponse>, ApiError> {
    let mut errors = FieldErrors::default();
    if let Some(schedule) = &update.schedule {
        errors.check_schedule(schedule);
    }
    if let Some(volume) = update.volume
        && !(0.0..=1.0).contains(&volume)
    {
        errors.add("volume", "The volume field must be between 0 and 1");
    }
    errors.into_result()?;

    let defaults = state.manifest().set_defaults(update).await?;

    Ok(Json(DefaultsResponse { ok: true, defaults }))
}

/// POST /overrides
pub async fn set_override(
    State(state): State<Arc<AppState>>,
    ApiJson(update): ApiJson<ManifestOverride>,
) -> Result<Json<OkResponse>, ApiError> {
    if update.src.trim().is_empty() {
        return Err(ApiError::bad_request("src is required"));
    }

    let mut errors = FieldErrors::default();
    if let Some(schedule) = &update.schedule {
        errors.check_schedule(schedule);
    }
    errors.into_result()?;

    state.manifest().set_override(update).await?;

    Ok(Json(OkResponse::ok()))
}

/// DELETE /overrides?src=
pub async fn delete_override(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OverrideQuery>,
) -> Result<Json<OkResponse>, ApiError> {
    let src = query
        .src
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("src is required"))?;

    if !state.manifest().delete_override(&src).await? {
        tracing::debug!(src = %src, "No override to delete");
    }

    Ok(Json(OkResponse::ok()))
}
