//! In-process pub/sub hub for grid events.
//!
//! Rendering clients never compute layouts themselves: they subscribe (via the
//! SSE route) and refetch when the engine announces a change.
//!
//! # Usage
//!
//! Producers (rotation engine, expiry sweep):
//!   hub.publish(GridEvent::RotationCompleted { .. });
//!
//! Consumers (SSE endpoint):
//!   let rx = hub.subscribe();

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Events pushed to passive readers of the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridEvent {
    #[serde(rename_all = "camelCase")]
    RotationCompleted {
        moved_count: usize,
        rotated_at: DateTime<Utc>,
        pages: Vec<u32>,
    },
    #[serde(rename_all = "camelCase")]
    SquaresExpired {
        count: u64,
        swept_at: DateTime<Utc>,
    },
}

impl GridEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            GridEvent::RotationCompleted { .. } => "rotation_completed",
            GridEvent::SquaresExpired { .. } => "squares_expired",
        }
    }
}

/// Thread-safe, cloneable broadcast hub.
#[derive(Clone)]
pub struct StreamHub {
    sender: broadcast::Sender<GridEvent>,
}

impl StreamHub {
    /// Create a new StreamHub with default capacity (256 events).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    /// Publish an event. No-op if no subscribers.
    pub fn publish(&self, event: GridEvent) {
        // Ignore send errors (no active receivers)
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GridEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}
