//! Domain event system: turn lifecycle notifications.
//!
//! The turn pipeline publishes events when something interesting happens.
//! The bus is an explicit value handed to whoever needs it; there is no
//! process-wide subscriber registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A turn was opened against a model source
    TurnStarted {
        turn_id: Uuid,
        session_id: String,
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// The model invoked a tool during a turn
    ToolUsed {
        turn_id: Uuid,
        tool: String,
        timestamp: DateTime<Utc>,
    },

    /// The turn finished and its meta frame was sent
    TurnCompleted {
        turn_id: Uuid,
        frames_sent: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The upstream source failed mid-turn
    TurnFailed {
        turn_id: Uuid,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The client went away before the turn finished
    ClientDisconnected {
        turn_id: Uuid,
        held_bytes: usize,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn turn_id(&self) -> Uuid {
        match self {
            Self::TurnStarted { turn_id, .. }
            | Self::ToolUsed { turn_id, .. }
            | Self::TurnCompleted { turn_id, .. }
            | Self::TurnFailed { turn_id, .. }
            | Self::ClientDisconnected { turn_id, .. } => *turn_id,
        }
    }
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Components can subscribe to receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
