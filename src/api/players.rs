use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::validation::FieldErrors;
use super::{ApiError, ApiJson, ApiPath, AppState, CurrentUser, FileCreated, PlayerDto};
use crate::db::{NewPlayer, PlayerChanges};
use crate::models::Schedule;
use crate::services::media::{self, MediaKind};

const DEFAULT_IMAGE_DURATION_MS: i64 = 10_000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerRequest {
    pub title: Option<String>,
    pub duration_ms: Option<Value>,
    pub schedule: Option<Schedule>,
}

/// Upload streamed to disk plus the text fields that came with it.
#[derive(Default)]
struct UploadForm {
    stored: Option<StoredUpload>,
    title: Option<String>,
    duration_ms: Option<String>,
    schedule: Option<String>,
}

struct StoredUpload {
    filename: String,
    client_name: String,
    kind: MediaKind,
    path: PathBuf,
}

/// Reads a millisecond duration sent as a JSON number or a numeric string.
fn parse_duration(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove rejected upload");
    }
}

async fn read_upload_form(
    state: &AppState,
    multipart: &mut Multipart,
    form: &mut UploadForm,
) -> Result<(), ApiError> {
    let max_bytes = state.config().media.max_upload_bytes();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") if form.stored.is_none() => {
                let client_name = field.file_name().unwrap_or_default().to_string();
                let kind = MediaKind::from_filename(&client_name)
                    .filter(|k| matches!(k, MediaKind::Image | MediaKind::Video))
                    .ok_or_else(|| {
                        ApiError::bad_request(format!(
                            "Invalid file extension for {client_name:?}; expected an image or video"
                        ))
                    })?;

                let filename = media::unique_filename(&client_name);
                let (mut file, path) = state.media().create(&filename).await?;
                // Registered before writing so a failed stream still gets cleaned up.
                form.stored = Some(StoredUpload {
                    filename,
                    client_name,
                    kind,
                    path: path.clone(),
                });

                let mut written = 0usize;
                while let Some(chunk) = field.chunk().await? {
                    written += chunk.len();
                    if written > max_bytes {
                        return Err(ApiError::PayloadTooLarge(format!(
                            "File size should be less than {}mb",
                            state.config().media.max_upload_mb
                        )));
                    }
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| ApiError::internal(format!("Failed to write upload: {e}")))?;
                }
                file.flush()
                    .await
                    .map_err(|e| ApiError::internal(format!("Failed to flush upload: {e}")))?;
            }
            Some("title") => form.title = Some(field.text().await?),
            Some("durationMs") => form.duration_ms = Some(field.text().await?),
            Some("schedule") => form.schedule = Some(field.text().await?),
            _ => {}
        }
    }

    Ok(())
}

fn build_new_player(
    state: &AppState,
    form: &UploadForm,
    upload: &StoredUpload,
    actor_id: i32,
) -> Result<NewPlayer, ApiError> {
    let mut errors = FieldErrors::default();

    let duration_ms = match (upload.kind, form.duration_ms.as_deref()) {
        (MediaKind::Video, _) => 0,
        (_, None) => DEFAULT_IMAGE_DURATION_MS,
        (_, Some(raw)) => match raw.trim().parse::<i64>() {
            Ok(ms) if ms > 0 => ms,
            _ => {
                errors.add("durationMs", "The durationMs field must be a positive number");
                DEFAULT_IMAGE_DURATION_MS
            }
        },
    };

    let schedule = match form.schedule.as_deref() {
        None => Schedule::all_week(&state.config().media.default_timezone),
        Some(raw) => match serde_json::from_str::<Schedule>(raw) {
            Ok(schedule) => {
                errors.check_schedule(&schedule);
                schedule
            }
            Err(e) => {
                errors.add("schedule", format!("The schedule field must be valid JSON: {e}"));
                Schedule::all_week(&state.config().media.default_timezone)
            }
        },
    };

    errors.into_result()?;

    let title = form
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| upload.client_name.clone());

    Ok(NewPlayer {
        file_type: upload.kind.as_str().to_string(),
        title,
        file_url: media::file_url(&upload.filename),
        duration_ms,
        schedule,
        last_modified: actor_id,
    })
}

/// POST /player
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FileCreated<PlayerDto>>), ApiError> {
    let mut form = UploadForm::default();

    if let Err(e) = read_upload_form(&state, &mut multipart, &mut form).await {
        if let Some(upload) = &form.stored {
            remove_partial(&upload.path).await;
        }
        return Err(e);
    }

    let Some(upload) = form.stored.as_ref() else {
        return Err(ApiError::bad_request("No file uploaded"));
    };

    let created = match build_new_player(&state, &form, upload, current.user().id) {
        Ok(new_player) => state.store().create_player(new_player).await.map_err(ApiError::from),
        Err(e) => Err(e),
    };
    let player = match created {
        Ok(player) => player,
        Err(e) => {
            remove_partial(&upload.path).await;
            return Err(e);
        }
    };

    metrics::counter!("signdesk_uploads_total", "kind" => upload.kind.as_str()).increment(1);
    info!(
        player_id = player.id,
        file = %upload.filename,
        kind = upload.kind.as_str(),
        "Media uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(FileCreated::new(upload.filename.clone(), PlayerDto::from(player))),
    ))
}

/// GET /player
pub async fn list_players(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PlayerDto>>, ApiError> {
    let players = state.store().list_players().await?;
    Ok(Json(players.into_iter().map(PlayerDto::from).collect()))
}

/// GET /player/{id}
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<PlayerDto>, ApiError> {
    let player = state
        .store()
        .get_player(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Player", id))?;

    Ok(Json(PlayerDto::from(player)))
}

/// PUT /player/{id}
pub async fn update_player(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdatePlayerRequest>,
) -> Result<Json<PlayerDto>, ApiError> {
    let mut errors = FieldErrors::default();

    let duration_ms = match payload.duration_ms.as_ref() {
        None | Some(Value::Null) => None,
        Some(value) => match parse_duration(value) {
            Some(ms) if ms > 0 => Some(ms),
            _ => {
                errors.add("durationMs", "The durationMs field must be a positive number");
                None
            }
        },
    };
    if let Some(schedule) = &payload.schedule {
        errors.check_schedule(schedule);
    }
    errors.into_result()?;

    let player = state
        .store()
        .update_player(
            id,
            PlayerChanges {
                title: payload.title,
                duration_ms,
                schedule: payload.schedule,
                last_modified: Some(current.user().id),
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Player", id))?;

    Ok(Json(PlayerDto::from(player)))
}

/// DELETE /player/{id}
pub async fn delete_player(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    let player = state
        .store()
        .get_player(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Player", id))?;

    if let Some(filename) = media::filename_from_url(&player.file_url)
        && let Err(e) = state.media().delete(filename).await
    {
        warn!(player_id = id, file = filename, error = %e, "Could not delete media file");
    }

    state.store().delete_player(id).await?;
    info!(player_id = id, "Player deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration(&json!(5000)), Some(5000));
        assert_eq!(parse_duration(&json!("7000")), Some(7000));
        assert_eq!(parse_duration(&json!("abc")), None);
        assert_eq!(parse_duration(&json!(1.5)), None);
        assert_eq!(parse_duration(&json!(null)), None);
    }
}
