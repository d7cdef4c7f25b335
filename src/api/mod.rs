use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod admin;
pub mod auth;
mod error;
mod html;
mod manifest;
mod observability;
mod passwords;
mod players;
mod types;
mod users;
pub mod validation;

pub use auth::CurrentUser;
pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

/// Multipart framing on top of the configured file size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn media(&self) -> &crate::services::MediaStorage {
        &self.shared.media
    }

    #[must_use]
    pub fn manifest(&self) -> &crate::services::ManifestService {
        &self.shared.manifest
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn crate::services::AuthService> {
        &self.shared.auth_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let media_root = config.media_root();
    let cors_origins = config.server.cors_allowed_origins.clone();
    let body_limit = config
        .media
        .max_upload_bytes()
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let api_router = Router::new()
        .route("/", get(hello))
        .route("/sessions", post(auth::login))
        .route("/forgot-password", post(passwords::forgot_password))
        .route("/reset-password", post(passwords::reset_password))
        .route("/manifest", get(manifest::get_manifest))
        .route("/metrics", get(observability::get_metrics))
        .merge(create_protected_router(state.clone()))
        .merge(create_admin_router(state.clone()))
        .route_layer(middleware::from_fn(observability::logging_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(api_router)
        .nest_service("/media", ServeDir::new(media_root))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

/// Routes for any signed-in user.
fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", delete(auth::logout))
        .route("/users/{id}", get(users::get_user).put(users::update_user))
        .route("/change-password/{id}", post(passwords::change_password))
        .route("/player", get(players::list_players).post(players::upload))
        .route(
            "/player/{id}",
            get(players::get_player)
                .put(players::update_player)
                .delete(players::delete_player),
        )
        .route("/html", get(html::list_html).post(html::create_html))
        .route("/html/deadline", post(html::create_deadline))
        .route("/html/duplicate/{id}", post(html::duplicate_html))
        .route(
            "/html/{id}",
            get(html::get_html)
                .put(html::update_html)
                .delete(html::delete_html),
        )
        .route("/defaults", post(manifest::set_defaults))
        .route(
            "/overrides",
            post(manifest::set_override).delete(manifest::delete_override),
        )
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

/// Routes that additionally require `isAdmin`.
fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", delete(users::delete_user))
        .route(
            "/change-password/admin/{id}",
            put(passwords::admin_change_password),
        )
        .route("/admin/state", get(admin::get_state))
        .route("/admin/local-ip", get(admin::get_local_ip))
        .route_layer(middleware::from_fn(auth::admin_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

async fn hello() -> Json<serde_json::Value> {
    Json(json!({ "hello": "world" }))
}
