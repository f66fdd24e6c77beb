//! Connection lifecycle controller.
//!
//! The single entry point for connect / heartbeat / disconnect signals and
//! sweep ticks. Pure orchestration over the registries, the event rings,
//! and the broadcaster; it holds no state of its own.
//!
//! Fan-out discipline: heartbeats never broadcast (they are high-frequency
//! and would storm every client), and a sweep tick emits one shared
//! `devices_update` after the whole evicted batch rather than one per
//! device.

use std::sync::Arc;

use ferry_core::{ConnectionId, DeviceInfo};
use ferry_events::{EventKind, EventLogs, EventRecord};
use ferry_presence::{DeviceRecord, DeviceStatus, PresenceRegistry};
use serde_json::Value;
use tracing::info;

use super::broadcast::BroadcastManager;

/// Channel carrying roster snapshots.
const DEVICES_UPDATE: &str = "devices_update";

/// Orchestrates registries, event rings, and fan-out.
pub struct ConnectionLifecycle {
    presence: Arc<PresenceRegistry>,
    events: Arc<EventLogs>,
    broadcast: Arc<BroadcastManager>,
}

impl ConnectionLifecycle {
    /// Wire the controller to its collaborators.
    #[must_use]
    pub fn new(
        presence: Arc<PresenceRegistry>,
        events: Arc<EventLogs>,
        broadcast: Arc<BroadcastManager>,
    ) -> Self {
        Self {
            presence,
            events,
            broadcast,
        }
    }

    /// A connection was accepted: track it, bind a session, announce it,
    /// and push the enlarged roster to everyone. Returns the new record so
    /// the gateway can reply to the initiating client.
    pub async fn on_connect(
        &self,
        connection_id: ConnectionId,
        device_info: DeviceInfo,
    ) -> DeviceRecord {
        let record = self.presence.on_connect(connection_id, device_info);
        info!(connection_id = %record.connection_id,
            device = %record.device_info.display_name, "client connected");

        let payload = to_value(&record);
        let _ = self.record_and_push(EventKind::Device, "connect", payload).await;
        self.push_roster().await;
        record
    }

    /// A heartbeat arrived. No broadcast.
    pub fn on_heartbeat(&self, connection_id: &ConnectionId) {
        self.presence.on_heartbeat(connection_id);
    }

    /// A connection closed. If it was still tracked, announce the
    /// departure (payload marked offline; the stored record is already
    /// gone) and push the shrunken roster. Double disconnects are no-ops.
    pub async fn on_disconnect(&self, connection_id: &ConnectionId) {
        let Some(mut record) = self.presence.on_disconnect(connection_id) else {
            return;
        };
        info!(connection_id = %record.connection_id,
            device = %record.device_info.display_name, "client disconnected");

        record.status = DeviceStatus::Offline;
        let payload = to_value(&record);
        let _ = self.record_and_push(EventKind::Device, "disconnect", payload).await;
        self.push_roster().await;
    }

    /// One sweep pass: evict stale devices, announce each departure, then
    /// push a single roster update for the whole batch. Returns how many
    /// devices were evicted.
    pub async fn on_sweep_tick(&self, threshold_secs: i64) -> usize {
        let evicted = self.presence.sweep(threshold_secs);
        if evicted.is_empty() {
            return 0;
        }
        info!(evicted = evicted.len(), "evicting devices with stale heartbeats");
        for mut record in evicted.iter().cloned() {
            record.status = DeviceStatus::Offline;
            let payload = to_value(&record);
            let _ = self.record_and_push(EventKind::Device, "disconnect", payload).await;
        }
        self.push_roster().await;
        evicted.len()
    }

    /// Record a file event (upload / delete) and push it to all clients.
    pub async fn record_file_event(&self, event_type: &str, data: Value) -> EventRecord {
        self.record_and_push(EventKind::File, event_type, data).await
    }

    /// Current roster snapshot, for request/reply paths.
    #[must_use]
    pub fn roster(&self) -> Value {
        to_value(&self.presence.list())
    }

    async fn record_and_push(
        &self,
        kind: EventKind,
        event_type: &str,
        data: Value,
    ) -> EventRecord {
        let record = self.events.record(kind, event_type, data);
        self.broadcast
            .push_to_all(kind.channel(), &to_value(&record))
            .await;
        record
    }

    async fn push_roster(&self) {
        self.broadcast.push_to_all(DEVICES_UPDATE, &self.roster()).await;
    }
}

/// Serialize infallibly; these types have no failing serialize paths.
fn to_value<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
