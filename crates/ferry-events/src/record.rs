//! Immutable event records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry in an event ring. Never mutated after append.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Domain tag: `"upload"`, `"delete"`, `"connect"`, `"disconnect"`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Free-form structured payload describing the event.
    pub data: Value,
    /// RFC 3339 timestamp assigned at append time.
    pub timestamp: String,
}
