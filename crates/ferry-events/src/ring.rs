//! Fixed-capacity event rings.

use std::collections::VecDeque;
use std::sync::Arc;

use ferry_core::Clock;
use parking_lot::Mutex;
use serde_json::Value;

use crate::record::EventRecord;

/// File-activity ring capacity.
pub const FILE_EVENT_CAPACITY: usize = 100;

/// Device-activity ring capacity.
pub const DEVICE_EVENT_CAPACITY: usize = 50;

/// Which ring an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Uploads and deletions.
    File,
    /// Connects and disconnects.
    Device,
}

impl EventKind {
    /// Push channel this kind of event is delivered on.
    #[must_use]
    pub fn channel(self) -> &'static str {
        match self {
            Self::File => "file_event",
            Self::Device => "device_event",
        }
    }

    /// Ring capacity for this kind.
    #[must_use]
    pub fn capacity(self) -> usize {
        match self {
            Self::File => FILE_EVENT_CAPACITY,
            Self::Device => DEVICE_EVENT_CAPACITY,
        }
    }
}

/// A single bounded ring of [`EventRecord`]s.
pub struct EventLog {
    capacity: usize,
    entries: Mutex<VecDeque<EventRecord>>,
}

impl EventLog {
    /// Create a ring holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append a record, evicting the oldest entry if the ring is full.
    pub fn append(&self, record: EventRecord) {
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            let _ = entries.pop_front();
        }
        entries.push_back(record);
    }

    /// Snapshot of the ring contents, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EventRecord> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the ring is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Both rings plus the clock that timestamps appended records.
pub struct EventLogs {
    file: EventLog,
    device: EventLog,
    clock: Arc<dyn Clock>,
}

impl EventLogs {
    /// Create the file and device rings at their standard capacities.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            file: EventLog::new(FILE_EVENT_CAPACITY),
            device: EventLog::new(DEVICE_EVENT_CAPACITY),
            clock,
        }
    }

    /// Timestamp and append an event, returning the stored record so the
    /// caller can fan it out.
    pub fn record(&self, kind: EventKind, event_type: &str, data: Value) -> EventRecord {
        let record = EventRecord {
            event_type: event_type.to_owned(),
            data,
            timestamp: self.clock.now().to_rfc3339(),
        };
        self.ring(kind).append(record.clone());
        record
    }

    /// Snapshot of one ring, oldest first.
    #[must_use]
    pub fn snapshot(&self, kind: EventKind) -> Vec<EventRecord> {
        self.ring(kind).snapshot()
    }

    fn ring(&self, kind: EventKind) -> &EventLog {
        match kind {
            EventKind::File => &self.file,
            EventKind::Device => &self.device,
        }
    }
}
