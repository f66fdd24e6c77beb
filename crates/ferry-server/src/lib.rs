//! # ferry-server
//!
//! Axum HTTP + `WebSocket` server for Ferry.
//!
//! - HTTP API: sessions, file upload/download/delete/search, device roster,
//!   event history, system info, QR code, health check
//! - `WebSocket` gateway: per-connection send loops, heartbeat intake,
//!   fan-out broadcasting to every connected client
//! - Connection lifecycle controller tying the presence and session
//!   registries to the event rings and the broadcaster
//! - Background sweep task evicting devices with stale heartbeats
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod health;
pub mod http;
pub mod qr;
pub mod server;
pub mod shutdown;
pub mod storage;
pub mod websocket;

pub use server::{AppState, FerryServer};
