//! System, config, QR, device-roster, and event-history endpoints.

use axum::Json;
use axum::extract::State;
use ferry_events::EventKind;
use serde_json::{Value, json};

use crate::qr;
use crate::server::AppState;

use super::error::ApiError;

/// Build the system-info snapshot shared by the HTTP endpoint and the
/// WebSocket `request_system_info` reply.
pub async fn build_system_info(state: &AppState) -> Value {
    let (upload_files, download_files) = match state.store.list_all().await {
        Ok(files) => {
            let inbound = files.iter().filter(|f| f.source == "phone").count();
            (inbound, files.len() - inbound)
        }
        Err(_) => (0, 0),
    };

    let local_ip = qr::local_ip();
    json!({
        "os": std::env::consts::OS,
        "hostname": hostname(),
        "localIp": local_ip,
        "serverUrl": qr::server_url(&local_ip, state.settings.server.port),
        "serverTime": chrono::Utc::now().to_rfc3339(),
        "uptimeSecs": state.start_time.elapsed().as_secs(),
        "activeSessions": state.sessions.count(),
        "connectedDevices": state.presence.count(),
        "devicesList": state.lifecycle.roster(),
        "uploadFiles": upload_files,
        "downloadFiles": download_files,
        "totalFiles": upload_files + download_files,
    })
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .unwrap_or_else(|_| "unknown".to_owned())
}

/// `GET /api/system-info`.
pub async fn system_info(State(state): State<AppState>) -> Json<Value> {
    Json(build_system_info(&state).await)
}

/// `GET /api/config` — the client-relevant slice of settings.
pub async fn config(State(state): State<AppState>) -> Json<Value> {
    let files = &state.settings.files;
    Json(json!({
        "maxUploadBytes": files.max_upload_bytes,
        "allowedExtensions": files.allowed_extensions,
        "autoRefreshIntervalSecs": state.settings.server.auto_refresh_interval_secs,
        "sessionEnabled": true,
    }))
}

/// `GET /api/devices` — current roster.
pub async fn devices(State(state): State<AppState>) -> Json<Value> {
    Json(state.lifecycle.roster())
}

/// `GET /api/events` — file-event history, oldest first.
pub async fn file_events(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.events.snapshot(EventKind::File)))
}

/// `GET /api/device-events` — device-event history, oldest first.
pub async fn device_events(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.events.snapshot(EventKind::Device)))
}

/// `GET /api/qr` — the server URL phones should open, as an SVG QR code.
pub async fn qr_code(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let local_ip = qr::local_ip();
    let url = qr::server_url(&local_ip, state.settings.server.port);
    let svg = qr::qr_svg(&url).map_err(|e| ApiError::Internal(Box::new(e)))?;
    Ok(Json(json!({
        "serverUrl": url,
        "localIp": local_ip,
        "svg": svg,
    })))
}
