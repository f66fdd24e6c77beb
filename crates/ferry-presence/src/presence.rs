//! Device presence registry — one record per live connection.
//!
//! Records are created on connect, refreshed by heartbeats, and removed on
//! explicit disconnect or by the periodic sweep, whichever happens first.
//! Eviction is pull-based: one sweep timer for the whole registry rather
//! than a timer per connection. With a 10-second sweep against a 30-second
//! threshold, a vanished device lingers at most ~40 seconds.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ferry_core::{Clock, ConnectionId, DeviceInfo, SessionToken};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::session::SessionRegistry;

/// Seconds without a heartbeat before a device is considered gone.
pub const OFFLINE_THRESHOLD_SECS: i64 = 30;

/// Seconds between sweep passes.
pub const SWEEP_INTERVAL_SECS: u64 = 10;

/// Online/offline marker. Stored records are always `Online`; `Offline`
/// only appears on outgoing disconnect payloads, after the record has
/// already left the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Tracked and heartbeating.
    Online,
    /// Departed; used in disconnect payloads only.
    Offline,
}

/// One tracked connection.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// The connection this record belongs to.
    pub connection_id: ConnectionId,
    /// What connected.
    pub device_info: DeviceInfo,
    /// When the connection was accepted.
    pub connected_at: DateTime<Utc>,
    /// Last heartbeat (or connect) time; the sweep measures from here.
    pub last_seen: DateTime<Utc>,
    /// Online while stored; Offline only on outgoing disconnect payloads.
    pub status: DeviceStatus,
    /// Session bound at connect. A non-owning reference: the session may
    /// expire underneath it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<SessionToken>,
    /// Session id bound at connect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<u64>,
}

/// Owns all device records, keyed by connection id.
pub struct PresenceRegistry {
    devices: Mutex<HashMap<ConnectionId, DeviceRecord>>,
    sessions: Arc<SessionRegistry>,
    clock: Arc<dyn Clock>,
}

impl PresenceRegistry {
    /// Create an empty registry bound to the session registry it should
    /// mint sessions through.
    #[must_use]
    pub fn new(sessions: Arc<SessionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            sessions,
            clock,
        }
    }

    /// Track a new connection. Binds (creates or reuses) a session for the
    /// device's address and stores its token and id in the record. Any
    /// pre-existing record under the same connection id is overwritten.
    pub fn on_connect(&self, connection_id: ConnectionId, device_info: DeviceInfo) -> DeviceRecord {
        let now = self.clock.now();
        let binding = self.sessions.create_or_reuse(&device_info);
        let record = DeviceRecord {
            connection_id: connection_id.clone(),
            device_info,
            connected_at: now,
            last_seen: now,
            status: DeviceStatus::Online,
            session_token: Some(binding.token),
            session_id: Some(binding.session_id),
        };
        let _ = self
            .devices
            .lock()
            .insert(connection_id.clone(), record.clone());
        debug!(%connection_id, session_id = record.session_id, "device connected");
        record
    }

    /// Refresh a device's heartbeat. A no-op when the connection is not
    /// tracked (it may have just been swept).
    pub fn on_heartbeat(&self, connection_id: &ConnectionId) {
        let now = self.clock.now();
        if let Some(record) = self.devices.lock().get_mut(connection_id) {
            record.last_seen = now;
            record.status = DeviceStatus::Online;
        }
    }

    /// Remove and return a device record. Absent is not an error; a double
    /// disconnect is a no-op.
    pub fn on_disconnect(&self, connection_id: &ConnectionId) -> Option<DeviceRecord> {
        let removed = self.devices.lock().remove(connection_id);
        if removed.is_some() {
            debug!(%connection_id, "device disconnected");
        }
        removed
    }

    /// Evict every device whose last heartbeat is older than
    /// `threshold_secs`, returning the evicted records for broadcasting.
    ///
    /// "Now" is read once, and the lock is held for the whole
    /// scan-and-evict pass so no record is observed mid-update.
    pub fn sweep(&self, threshold_secs: i64) -> Vec<DeviceRecord> {
        let now = self.clock.now();
        let mut devices = self.devices.lock();
        let stale: Vec<ConnectionId> = devices
            .iter()
            .filter(|(_, record)| (now - record.last_seen).num_seconds() > threshold_secs)
            .map(|(id, _)| id.clone())
            .collect();
        let evicted: Vec<DeviceRecord> = stale
            .iter()
            .filter_map(|id| devices.remove(id))
            .collect();
        if !evicted.is_empty() {
            debug!(evicted = evicted.len(), "swept stale devices");
        }
        evicted
    }

    /// Snapshot of all tracked devices.
    #[must_use]
    pub fn list(&self) -> Vec<DeviceRecord> {
        self.devices.lock().values().cloned().collect()
    }

    /// Number of tracked devices.
    #[must_use]
    pub fn count(&self) -> usize {
        self.devices.lock().len()
    }
}
