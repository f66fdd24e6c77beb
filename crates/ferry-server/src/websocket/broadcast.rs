//! Event fan-out to connected WebSocket clients.
//!
//! Delivery is fire-and-forget: the payload is serialized once, shared via
//! `Arc`, and `try_send`-pushed into each client's bounded channel. A slow
//! client loses messages rather than stalling everyone else, and is
//! disconnected outright once its lifetime drop count crosses a threshold.
//! No registry lock is held during delivery; callers pass in snapshots.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ferry_core::{Clock, ConnectionId};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::ClientConnection;

/// Maximum total lifetime message drops before forcibly removing a slow
/// client from the broadcast set.
const MAX_TOTAL_DROPS: u64 = 100;

/// Manages push delivery to all connected clients.
pub struct BroadcastManager {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Atomic counter tracking total connections (avoids read-locking for
    /// count queries).
    active_count: AtomicUsize,
    clock: Arc<dyn Clock>,
}

impl BroadcastManager {
    /// Create a new broadcast manager.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
            clock,
        }
    }

    /// Add a connection.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        if conns.insert(connection.id.clone(), connection).is_none() {
            let _ = self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove a connection by ID.
    pub async fn remove(&self, connection_id: &ConnectionId) {
        let mut conns = self.connections.write().await;
        if conns.remove(connection_id).is_some() {
            let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Push `payload` to every connected client on `channel`.
    pub async fn push_to_all(&self, channel: &str, payload: &Value) {
        let Some(json) = self.envelope(channel, payload) else {
            return;
        };
        let mut to_remove = Vec::new();
        {
            let conns = self.connections.read().await;
            let mut recipients = 0u32;
            for conn in conns.values() {
                recipients += 1;
                if !conn.send(Arc::clone(&json)) {
                    let drops = conn.drop_count();
                    if drops >= MAX_TOTAL_DROPS {
                        warn!(conn_id = %conn.id, channel, drops, "removing slow client");
                        to_remove.push(conn.id.clone());
                    } else {
                        warn!(conn_id = %conn.id, channel, total_drops = drops,
                            "failed to push to client (channel full)");
                    }
                }
            }
            debug!(channel, recipients, "broadcast");
        }
        if !to_remove.is_empty() {
            let mut conns = self.connections.write().await;
            for id in &to_remove {
                if conns.remove(id).is_some() {
                    let _ = self.active_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Push `payload` to a single client, if it is still connected.
    pub async fn push_to_one(&self, connection_id: &ConnectionId, channel: &str, payload: &Value) {
        let Some(json) = self.envelope(channel, payload) else {
            return;
        };
        let conns = self.connections.read().await;
        if let Some(conn) = conns.get(connection_id) {
            if !conn.send(json) {
                warn!(conn_id = %connection_id, channel, "failed to push to client");
            }
        }
    }

    /// Number of active connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Serialize the wire envelope `{type, data, timestamp}` once.
    fn envelope(&self, channel: &str, payload: &Value) -> Option<Arc<String>> {
        let envelope = serde_json::json!({
            "type": channel,
            "data": payload,
            "timestamp": self.clock.now().to_rfc3339(),
        });
        match serde_json::to_string(&envelope) {
            Ok(json) => Some(Arc::new(json)),
            Err(e) => {
                warn!(channel, error = %e, "failed to serialize push payload");
                None
            }
        }
    }
}
