//! # ferry-core
//!
//! Foundation types shared across the Ferry workspace:
//!
//! - Branded IDs: connection IDs (UUID v7) and session tokens (random,
//!   URL-safe, unguessable)
//! - `Clock` abstraction so registries can be driven by a test clock
//! - Device detection from `User-Agent` strings
//! - Human-readable byte formatting

#![deny(unsafe_code)]

pub mod clock;
pub mod device;
pub mod format;
pub mod ids;

pub use clock::{Clock, ManualClock, SystemClock};
pub use device::{DeviceInfo, DeviceKind};
pub use ids::{ConnectionId, SessionToken};
