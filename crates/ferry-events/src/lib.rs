//! # ferry-events
//!
//! Bounded, in-memory event history for the activity feed.
//!
//! Two rings are kept: file activity (uploads, deletions) and device
//! activity (connects, disconnects). Each ring holds a fixed number of
//! immutable [`EventRecord`]s and silently drops the oldest entry once
//! full. Nothing here survives a restart; the feed is a live convenience,
//! not an audit log.

#![deny(unsafe_code)]

pub mod record;
pub mod ring;

pub use record::EventRecord;
pub use ring::{EventKind, EventLog, EventLogs, DEVICE_EVENT_CAPACITY, FILE_EVENT_CAPACITY};
