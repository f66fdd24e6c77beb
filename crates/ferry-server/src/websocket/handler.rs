//! Inbound client message parsing.
//!
//! Clients speak a tiny JSON protocol: `{"type": "heartbeat"}` and two
//! request messages. Anything unparseable is ignored by the gateway so a
//! confused client cannot take its own connection down.

use serde::Deserialize;

/// A message received from a client over the WebSocket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness signal; refreshes the device's presence record.
    Heartbeat,
    /// Client wants a fresh system-info snapshot.
    RequestSystemInfo,
    /// Client wants the current device roster.
    RequestDevices,
}

/// Parse an inbound text frame. `None` for malformed or unknown messages.
#[must_use]
pub fn parse_message(text: &str) -> Option<ClientMessage> {
    serde_json::from_str(text).ok()
}
