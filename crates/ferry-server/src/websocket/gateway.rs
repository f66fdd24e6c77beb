//! Per-socket session loop — from upgrade to cleanup.
//!
//! 1. Registers the connection with the broadcast manager
//! 2. Runs the lifecycle connect path and replies with a `connected`
//!    envelope carrying the session token and device record
//! 3. Forwards queued outbound messages to the socket
//! 4. Dispatches inbound frames (heartbeats, info requests)
//! 5. On close, removes the connection and runs the disconnect path

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use ferry_core::{ConnectionId, DeviceInfo};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use crate::http::system::build_system_info;
use crate::server::AppState;

use super::connection::ClientConnection;
use super::handler::{ClientMessage, parse_message};

/// Outbound queue depth per client. Full queue means drops, not blocking.
const SEND_BUFFER: usize = 256;

/// Run a WebSocket session for a connected client.
#[instrument(skip_all, fields(connection_id = %connection_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    connection_id: ConnectionId,
    device_info: DeviceInfo,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(SEND_BUFFER);
    let connection = Arc::new(ClientConnection::new(connection_id.clone(), send_tx));
    state.broadcast.add(connection.clone()).await;

    let record = state
        .lifecycle
        .on_connect(connection_id.clone(), device_info)
        .await;

    // Reply to the initiating client with its identity.
    let connected = json!({
        "type": "connected",
        "data": {
            "sessionToken": record.session_token,
            "deviceInfo": record.device_info,
            "connectionId": record.connection_id,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    let _ = connection.send_json(&connected);

    // Outbound forwarder: queued messages → socket.
    let outbound = tokio::spawn(async move {
        while let Some(text) = send_rx.recv().await {
            if ws_tx.send(Message::Text((*text).clone().into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop.
    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(ref t) => t.to_string(),
            Message::Binary(ref data) => match std::str::from_utf8(data) {
                Ok(s) => s.to_owned(),
                Err(_) => {
                    debug!(len = data.len(), "ignoring non-UTF8 binary frame");
                    continue;
                }
            },
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        match parse_message(&text) {
            Some(ClientMessage::Heartbeat) => {
                state.lifecycle.on_heartbeat(&connection_id);
            }
            Some(ClientMessage::RequestSystemInfo) => {
                let info = build_system_info(&state).await;
                state
                    .broadcast
                    .push_to_one(&connection_id, "system_info", &info)
                    .await;
            }
            Some(ClientMessage::RequestDevices) => {
                state
                    .broadcast
                    .push_to_one(&connection_id, "devices_list", &state.lifecycle.roster())
                    .await;
            }
            None => {
                debug!(frame = %text, "ignoring unrecognized message");
            }
        }
    }

    // Cleanup. Removal from the broadcast set comes first so the departing
    // client is not pushed its own disconnect fan-out.
    state.broadcast.remove(&connection_id).await;
    state.lifecycle.on_disconnect(&connection_id).await;
    outbound.abort();
}
