//! # Event Bus System
//!
//! Broadcast channel for sync lifecycle events, built on
//! `tokio::sync::broadcast`. Subscribers (telemetry, admin surfaces) observe
//! run progress without coupling to the sync engine.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::events::{EventBus, CoreEvent, SyncEvent};
//!
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Sync(SyncEvent::Started {
//!     run_id: "run-1".to_string(),
//!     full_sync: true,
//! })).ok();
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Sync lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncEvent {
    /// A sync run started.
    Started { run_id: String, full_sync: bool },

    /// One listing page was fully dispatched and the cursor advanced.
    PageCompleted {
        run_id: String,
        page: u64,
        entries: u64,
    },

    /// The remote reported the stored cursor invalid; the run restarted from
    /// a full listing.
    CursorReset { run_id: String },

    /// The run finished.
    Completed {
        run_id: String,
        entries_seen: u64,
        enqueued: u64,
        processed_inline: u64,
        deleted: u64,
        failed: u64,
    },

    /// The run failed before completing.
    Failed { run_id: String, message: String },
}

/// Top-level event envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreEvent {
    Sync(SyncEvent),
}

/// Central broadcast bus.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Returns the number of active subscribers, or an
    /// error when there are none (safe to ignore).
    pub fn emit(&self, event: CoreEvent) -> Result<usize, broadcast::error::SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Subscribe to all events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
