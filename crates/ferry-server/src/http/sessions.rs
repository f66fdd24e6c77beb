//! Session endpoints: create, validate, list.

use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use ferry_core::{DeviceInfo, SessionToken};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::server::AppState;

/// Body of `POST /api/session/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    /// Token to check.
    pub token: SessionToken,
}

/// Derive device info from request metadata, as the WebSocket path does.
pub fn device_from_request(headers: &HeaderMap, addr: SocketAddr) -> DeviceInfo {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    DeviceInfo::from_user_agent(user_agent, &addr.ip().to_string())
}

/// `POST /api/session/create` — create or reuse a session for the caller's
/// address.
pub async fn create(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<Value> {
    let device_info = device_from_request(&headers, addr);
    let binding = state.sessions.create_or_reuse(&device_info);
    Json(json!({
        "success": true,
        "token": binding.token,
        "sessionId": binding.session_id,
        "deviceInfo": device_info,
        "isNew": binding.is_new,
    }))
}

/// `POST /api/session/validate` — check a token.
///
/// Expired and unknown tokens both answer `valid: false`; this is a
/// structured outcome, not an error.
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Json<Value> {
    if state.sessions.validate(&req.token) {
        let device_info = state.sessions.get(&req.token).map(|r| r.device_info);
        Json(json!({
            "success": true,
            "valid": true,
            "deviceInfo": device_info,
        }))
    } else {
        Json(json!({
            "success": true,
            "valid": false,
        }))
    }
}

/// `GET /api/session/active` — snapshot of stored sessions.
pub async fn active(State(state): State<AppState>) -> Json<Value> {
    let sessions: Vec<Value> = state
        .sessions
        .list()
        .into_iter()
        .map(|s| {
            json!({
                "token": s.token,
                "deviceInfo": s.device_info,
                "createdAt": s.created_at,
                "lastActivity": s.last_activity,
            })
        })
        .collect();
    Json(json!({
        "success": true,
        "count": sessions.len(),
        "sessions": sessions,
    }))
}
