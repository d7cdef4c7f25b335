//! Administrative endpoints.
//!
//! Operator-facing views of the running instance: a snapshot of everything
//! the players see, and the LAN address screens should point at.

use axum::{Json, extract::State};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use tokio::net::UdpSocket;

use super::{ApiError, AppState};
use crate::models::Manifest;
use crate::services::MediaFile;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub users: u64,
    pub players: u64,
    pub html_players: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStateResponse {
    pub version: &'static str,
    pub uptime_secs: u64,
    pub counts: EntityCounts,
    pub media_files: Vec<MediaFile>,
    pub manifest: Manifest,
}

#[derive(Debug, Serialize)]
pub struct LocalIpResponse {
    pub ip: String,
    pub port: u16,
    pub url: String,
}

/// GET /admin/state
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminStateResponse>, ApiError> {
    let store = state.store();

    let counts = EntityCounts {
        users: store.count_users().await?,
        players: store.count_players().await?,
        html_players: store.count_html_players().await?,
    };
    let media_files = state.media().list().await?;
    let manifest = state.manifest().read().await;

    Ok(Json(AdminStateResponse {
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.start_time.elapsed().as_secs(),
        counts,
        media_files,
        manifest,
    }))
}

/// GET /admin/local-ip
pub async fn get_local_ip(State(state): State<Arc<AppState>>) -> Json<LocalIpResponse> {
    let ip = detect_lan_ip()
        .await
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let port = state.config().server.port;

    Json(LocalIpResponse {
        ip: ip.to_string(),
        port,
        url: format!("http://{ip}:{port}"),
    })
}

/// Address of the interface that routes outward. Connecting a UDP socket
/// sends nothing; it only makes the OS pick a source address.
async fn detect_lan_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await.ok()?;
    socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80)).await.ok()?;
    let ip = socket.local_addr().ok()?.ip();

    (!ip.is_unspecified()).then_some(ip)
}
