//! WebSocket gateway: connection state, fan-out, message dispatch, and the
//! connection lifecycle controller.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | Per-client send channel and drop accounting |
//! | `broadcast` | Fan-out manager: registered clients, push-to-all/one |
//! | `handler` | Inbound client message parsing |
//! | `lifecycle` | Connect/heartbeat/disconnect/sweep orchestration |
//! | `gateway` | Per-socket read/write loops from upgrade to cleanup |
//! | `sweep` | Background eviction loop for stale heartbeats |

pub mod broadcast;
pub mod connection;
pub mod gateway;
pub mod handler;
pub mod lifecycle;
pub mod sweep;
