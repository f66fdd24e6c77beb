//! Session registry — create-or-reuse, validate, list.
//!
//! A session is a logical client identity that outlives any single
//! WebSocket connection. At most one active session exists per originating
//! address: a second connect from the same address reuses and refreshes the
//! existing token instead of minting a new one.
//!
//! Expiry is lazy. Sessions older than [`SESSION_TTL_SECS`] are deleted the
//! next time `validate` touches them; the sweep task never looks at this
//! registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use ferry_core::{Clock, DeviceInfo, SessionToken};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// Session lifetime in seconds (24 hours), measured from creation.
pub const SESSION_TTL_SECS: i64 = 86_400;

/// One logical client identity.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Unguessable token handed to the client.
    pub token: SessionToken,
    /// Process-lifetime-unique, monotonically increasing id.
    pub session_id: u64,
    /// Latest known device snapshot for this identity.
    pub device_info: DeviceInfo,
    /// When the session was minted. Expiry is measured from here.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every successful validation and on reuse.
    pub last_activity: DateTime<Utc>,
    /// Always true for stored records; kept for the wire format.
    pub is_active: bool,
}

/// What `create_or_reuse` handed back.
#[derive(Clone, Debug)]
pub struct SessionBinding {
    /// The session token (existing or fresh).
    pub token: SessionToken,
    /// The session id (unchanged on reuse).
    pub session_id: u64,
    /// False when an existing session was reused.
    pub is_new: bool,
}

/// Token map plus the address index used for deduplication. Guarded by a
/// single lock so the two stay consistent.
#[derive(Default)]
struct Maps {
    by_token: HashMap<SessionToken, SessionRecord>,
    by_address: HashMap<String, SessionToken>,
}

/// Owns all session records.
pub struct SessionRegistry {
    maps: Mutex<Maps>,
    counter: AtomicU64,
    clock: Arc<dyn Clock>,
    ttl_secs: i64,
}

impl SessionRegistry {
    /// Create an empty registry with the standard 24-hour TTL.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, SESSION_TTL_SECS)
    }

    /// Create an empty registry with a custom TTL in seconds.
    #[must_use]
    pub fn with_ttl(clock: Arc<dyn Clock>, ttl_secs: i64) -> Self {
        Self {
            maps: Mutex::new(Maps::default()),
            counter: AtomicU64::new(0),
            clock,
            ttl_secs,
        }
    }

    /// Return the existing session for this device's address, refreshing
    /// it, or mint a new one. Always succeeds.
    pub fn create_or_reuse(&self, device_info: &DeviceInfo) -> SessionBinding {
        let now = self.clock.now();
        let address = device_info.source_address.clone();
        let mut maps = self.maps.lock();

        if let Some(token) = maps.by_address.get(&address).cloned() {
            if let Some(record) = maps.by_token.get_mut(&token) {
                record.last_activity = now;
                record.device_info = device_info.clone();
                debug!(session_id = record.session_id, %address, "session reused");
                return SessionBinding {
                    token,
                    session_id: record.session_id,
                    is_new: false,
                };
            }
            // Stale index entry (session was reaped); fall through and mint.
            let _ = maps.by_address.remove(&address);
        }

        let token = SessionToken::generate();
        let session_id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let record = SessionRecord {
            token: token.clone(),
            session_id,
            device_info: device_info.clone(),
            created_at: now,
            last_activity: now,
            is_active: true,
        };
        let _ = maps.by_token.insert(token.clone(), record);
        let _ = maps.by_address.insert(address.clone(), token.clone());
        debug!(session_id, %address, "session created");

        SessionBinding {
            token,
            session_id,
            is_new: true,
        }
    }

    /// Check a token. Unknown tokens fail; tokens past the TTL are deleted
    /// and fail; otherwise `last_activity` is refreshed.
    ///
    /// Not a pure read: validation mutates or deletes state.
    pub fn validate(&self, token: &SessionToken) -> bool {
        let now = self.clock.now();
        let mut maps = self.maps.lock();

        let Some(record) = maps.by_token.get_mut(token) else {
            return false;
        };

        if (now - record.created_at).num_seconds() > self.ttl_secs {
            let address = record.device_info.source_address.clone();
            let session_id = record.session_id;
            let _ = maps.by_token.remove(token);
            if maps.by_address.get(&address) == Some(token) {
                let _ = maps.by_address.remove(&address);
            }
            debug!(session_id, "session expired");
            return false;
        }

        record.last_activity = now;
        true
    }

    /// Fetch a session snapshot without touching its activity timestamps.
    #[must_use]
    pub fn get(&self, token: &SessionToken) -> Option<SessionRecord> {
        self.maps.lock().by_token.get(token).cloned()
    }

    /// Snapshot of all active sessions. No expiry check is performed, so
    /// logically expired but not-yet-reaped entries may appear.
    #[must_use]
    pub fn list(&self) -> Vec<SessionRecord> {
        self.maps
            .lock()
            .by_token
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect()
    }

    /// Number of stored sessions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.maps.lock().by_token.len()
    }
}
