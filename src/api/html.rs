use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::validation::FieldErrors;
use super::{ApiError, ApiJson, ApiPath, AppState, CurrentUser, FileCreated, HtmlPlayerDto};
use crate::db::NewHtmlPlayer;
use crate::entities::html_players;
use crate::models::Schedule;
use crate::services::html::{
    self, CountdownConfig, NoticeFields, NoticeStyle, render_countdown, render_notice,
};
use crate::services::media::{self, MediaKind, sanitize_filename};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHtmlRequest {
    pub filename: Option<String>,
    #[serde(flatten)]
    pub fields: NoticeFields,
    pub schedule: Option<Schedule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeadlineRequest {
    pub title: Option<String>,
    #[serde(rename = "deadlineISO")]
    pub deadline_iso: Option<String>,
    pub filename: Option<String>,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub accent_color: Option<String>,
    pub font_family: Option<String>,
    pub schedule: Option<Schedule>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateHtmlRequest {
    #[serde(flatten)]
    pub fields: NoticeFields,
    pub schedule: Option<Schedule>,
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Sanitized `.html`/`.htm` name, or `<prefix>-<ms>.html` when none was given.
fn html_filename(requested: Option<&str>, prefix: &str) -> Result<String, ApiError> {
    let name = requested
        .and_then(sanitize_filename)
        .unwrap_or_else(|| format!("{prefix}-{}.html", now_millis()));

    if MediaKind::from_filename(&name) != Some(MediaKind::Html) {
        return Err(ApiError::bad_request("filename must end with .html"));
    }
    Ok(name)
}

/// `<title lowercased, whitespace runs as '-'>-copia-<ms>.html`, sanitized.
fn duplicate_filename(title: &str) -> Option<String> {
    let slug = title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    sanitize_filename(&format!("{slug}-copia-{}.html", now_millis()))
}

fn check_schedule(schedule: Option<&Schedule>) -> Result<(), ApiError> {
    let mut errors = FieldErrors::default();
    if let Some(schedule) = schedule {
        errors.check_schedule(schedule);
    }
    errors.into_result()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Page for a stored row. Countdowns keep the accent colour of `previous`.
fn render_page(player: &html_players::Model, previous: Option<&str>) -> Result<String, ApiError> {
    let Some(mut config) = CountdownConfig::from_model(player) else {
        return Ok(render_notice(&NoticeStyle::from_model(player)));
    };
    if let Some(accent) = previous
        .and_then(CountdownConfig::from_page)
        .map(|old| old.accent_color)
    {
        config.accent_color = accent;
    }
    render_countdown(&config)
        .map_err(|e| ApiError::internal(format!("Failed to encode countdown config: {e}")))
}

/// Inserts the row for a page that was already written, removing the page
/// again if the insert fails.
async fn insert_for_page(
    state: &AppState,
    filename: &str,
    player: NewHtmlPlayer,
) -> Result<html_players::Model, ApiError> {
    match state.store().create_html_player(player).await {
        Ok(player) => Ok(player),
        Err(e) => {
            if let Err(cleanup) = state.media().delete(filename).await {
                warn!(file = filename, error = %cleanup, "Could not remove orphaned page");
            }
            Err(e.into())
        }
    }
}

/// POST /html
pub async fn create_html(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<CreateHtmlRequest>,
) -> Result<(StatusCode, Json<FileCreated<HtmlPlayerDto>>), ApiError> {
    check_schedule(payload.schedule.as_ref())?;
    let filename = html_filename(payload.filename.as_deref(), "aviso")?;

    let style = NoticeStyle::from_fields(&payload.fields);
    state.media().write(&filename, &render_notice(&style)).await?;

    let schedule = payload
        .schedule
        .unwrap_or_else(|| Schedule::all_week(&state.config().media.default_timezone));

    let player = insert_for_page(
        &state,
        &filename,
        NewHtmlPlayer {
            html_url: media::file_url(&filename),
            title: style.title,
            body_html: style.body_html,
            bg_color: style.bg_color,
            text_color: style.text_color,
            font_family: style.font_family,
            font_size_px: style.font_size_px,
            text_align: style.text_align,
            padding_px: style.padding_px,
            max_width_px: style.max_width_px,
            schedule,
            last_modified: current.user().id,
        },
    )
    .await?;

    info!(html_player_id = player.id, file = %filename, "Html notice created");

    Ok((
        StatusCode::CREATED,
        Json(FileCreated::new(filename, HtmlPlayerDto::from(player))),
    ))
}

/// POST /html/deadline
pub async fn create_deadline(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<CreateDeadlineRequest>,
) -> Result<(StatusCode, Json<FileCreated<HtmlPlayerDto>>), ApiError> {
    let (Some(title), Some(deadline_iso)) =
        (non_empty(payload.title), non_empty(payload.deadline_iso))
    else {
        return Err(ApiError::bad_request("title and deadlineISO are required"));
    };
    check_schedule(payload.schedule.as_ref())?;
    let filename = html_filename(payload.filename.as_deref(), "deadline")?;

    let mut config = CountdownConfig::new(title, deadline_iso);
    if let Some(v) = non_empty(payload.bg_color) {
        config.bg_color = v;
    }
    if let Some(v) = non_empty(payload.text_color) {
        config.text_color = v;
    }
    if let Some(v) = non_empty(payload.accent_color) {
        config.accent_color = v;
    }
    if let Some(v) = non_empty(payload.font_family) {
        config.font_family = v;
    }

    let page = render_countdown(&config)
        .map_err(|e| ApiError::internal(format!("Failed to encode countdown config: {e}")))?;
    state.media().write(&filename, &page).await?;

    let schedule = payload
        .schedule
        .unwrap_or_else(|| Schedule::all_week(&state.config().media.default_timezone));

    let player = insert_for_page(
        &state,
        &filename,
        NewHtmlPlayer {
            html_url: media::file_url(&filename),
            body_html: config.body_placeholder(),
            title: config.title,
            bg_color: config.bg_color,
            text_color: config.text_color,
            font_family: config.font_family,
            font_size_px: html::DEFAULT_FONT_SIZE_PX,
            text_align: html::DEFAULT_TEXT_ALIGN.to_string(),
            padding_px: html::DEFAULT_PADDING_PX,
            max_width_px: html::DEFAULT_MAX_WIDTH_PX,
            schedule,
            last_modified: current.user().id,
        },
    )
    .await?;

    info!(html_player_id = player.id, file = %filename, "Countdown created");

    Ok((
        StatusCode::CREATED,
        Json(FileCreated::new(filename, HtmlPlayerDto::from(player))),
    ))
}

/// POST /html/duplicate/{id}
pub async fn duplicate_html(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
) -> Result<(StatusCode, Json<FileCreated<HtmlPlayerDto>>), ApiError> {
    let original = state
        .store()
        .get_html_player(id)
        .await?
        .ok_or_else(|| ApiError::not_found("HtmlPlayer", id))?;

    let filename = duplicate_filename(&original.title)
        .ok_or_else(|| ApiError::bad_request("Invalid filename generated"))?;

    match media::filename_from_url(&original.html_url) {
        Some(source) if state.media().exists(source).await => {
            state.media().copy(source, &filename).await?;
        }
        _ => {
            warn!(html_player_id = id, "Source page missing, regenerating copy");
            state
                .media()
                .write(&filename, &render_page(&original, None)?)
                .await?;
        }
    }

    let mut copy = NewHtmlPlayer::from_existing(
        &original,
        format!("{} (Cópia)", original.title),
        media::file_url(&filename),
    );
    copy.last_modified = current.user().id;

    let player = insert_for_page(&state, &filename, copy).await?;

    info!(
        html_player_id = player.id,
        source_id = original.id,
        file = %filename,
        "Html notice duplicated"
    );

    Ok((
        StatusCode::CREATED,
        Json(FileCreated::new(filename, HtmlPlayerDto::from(player))),
    ))
}

/// GET /html
pub async fn list_html(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HtmlPlayerDto>>, ApiError> {
    let players = state.store().list_html_players().await?;
    Ok(Json(players.into_iter().map(HtmlPlayerDto::from).collect()))
}

/// GET /html/{id}
pub async fn get_html(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<HtmlPlayerDto>, ApiError> {
    let player = state
        .store()
        .get_html_player(id)
        .await?
        .ok_or_else(|| ApiError::not_found("HtmlPlayer", id))?;

    Ok(Json(HtmlPlayerDto::from(player)))
}

/// PUT /html/{id}
pub async fn update_html(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateHtmlRequest>,
) -> Result<Json<HtmlPlayerDto>, ApiError> {
    check_schedule(payload.schedule.as_ref())?;

    let mut player = state
        .store()
        .get_html_player(id)
        .await?
        .ok_or_else(|| ApiError::not_found("HtmlPlayer", id))?;

    let visual_change = !payload.fields.is_empty();
    if visual_change {
        let mut style = NoticeStyle::from_model(&player);
        style.apply(&payload.fields);
        style.write_to(&mut player);
    }
    if let Some(schedule) = payload.schedule {
        player.schedule = schedule;
    }
    player.last_modified = current.user().id;

    let player = state.store().save_html_player(player).await?;

    if visual_change && let Some(filename) = media::filename_from_url(&player.html_url) {
        let previous = state.media().read_to_string(filename).await.ok();
        let page = render_page(&player, previous.as_deref())?;
        state.media().write(filename, &page).await?;
    }

    Ok(Json(HtmlPlayerDto::from(player)))
}

/// DELETE /html/{id}
pub async fn delete_html(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, ApiError> {
    let player = state
        .store()
        .get_html_player(id)
        .await?
        .ok_or_else(|| ApiError::not_found("HtmlPlayer", id))?;

    if let Some(filename) = media::filename_from_url(&player.html_url)
        && let Err(e) = state.media().delete(filename).await
    {
        warn!(html_player_id = id, file = filename, error = %e, "Could not delete media file");
    }

    state.store().delete_html_player(id).await?;
    info!(html_player_id = id, "Html notice deleted");

    Ok(StatusCode::NO_CONTENT)
}
