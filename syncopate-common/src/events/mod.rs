//! Client event types and EventBus
//!
//! Controllers publish state changes here; front-ends subscribe and redraw.

// Sub-modules (supporting types)
mod state_types;

pub use state_types::{SessionState, WriteState};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::CandidateId;

/// Client event types
///
/// Serializable so a front-end in another process can be fed the same
/// stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Session status changed
    SessionChanged {
        state: SessionState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Review queue loaded with `len` candidates
    QueueLoaded { len: usize },

    /// Cursor moved to the next candidate
    QueueAdvanced { cursor: usize, len: usize },

    /// Cursor reached the end of the queue (or the queue was empty)
    QueueExhausted,

    /// Local favorite flag changed
    FavoriteChanged {
        concert_id: CandidateId,
        favorite: bool,
        write: WriteState,
    },

    /// Aggregated items for the current candidate changed
    AggregationUpdated { epoch: u64, items: Vec<String> },

    /// A swallowed failure a front-end may show as a one-line message
    ErrorSurfaced { message: String },
}

/// Broadcast channel for [`ClientEvent`]s
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering `capacity` events per slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: ClientEvent) -> Result<usize, broadcast::error::SendError<ClientEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(ClientEvent::QueueAdvanced { cursor: 1, len: 3 }).unwrap();
        bus.emit_lossy(ClientEvent::QueueExhausted);

        assert_eq!(rx.recv().await.unwrap(), ClientEvent::QueueAdvanced { cursor: 1, len: 3 });
        assert_eq!(rx.recv().await.unwrap(), ClientEvent::QueueExhausted);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        assert!(bus.emit(ClientEvent::QueueExhausted).is_err());
        bus.emit_lossy(ClientEvent::QueueExhausted);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.capacity(), 4);
    }

    #[test]
    fn test_write_state_serialization() {
        let json = serde_json::to_value(WriteState::Failed("boom".into())).unwrap();
        assert_eq!(json, serde_json::json!({"state": "failed", "message": "boom"}));
        let json = serde_json::to_value(WriteState::Pending).unwrap();
        assert_eq!(json, serde_json::json!({"state": "pending"}));
    }
}
