//! # ferry-presence
//!
//! The stateful heart of Ferry: who is connected right now, and which
//! logical client identity each connection belongs to.
//!
//! - [`session::SessionRegistry`] owns session records keyed by token,
//!   deduplicated per originating address, expired lazily after 24 hours.
//! - [`presence::PresenceRegistry`] owns one device record per live
//!   connection, refreshed by heartbeats and evicted by a periodic sweep
//!   once heartbeats go stale.
//!
//! Both registries are internally locked and safe to share behind `Arc`
//! between request handlers, socket tasks, and the sweep task. All state
//! is memory-only and lost on restart by design.

#![deny(unsafe_code)]

pub mod presence;
pub mod session;

pub use presence::{
    DeviceRecord, DeviceStatus, PresenceRegistry, OFFLINE_THRESHOLD_SECS, SWEEP_INTERVAL_SECS,
};
pub use session::{SessionBinding, SessionRecord, SessionRegistry, SESSION_TTL_SECS};
