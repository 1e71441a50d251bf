//! Broadcast event bus for patrol events

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::PatrolEvent;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

/// Fire-and-forget pub/sub over a tokio broadcast channel.
///
/// Publishing never fails; events sent with no subscribers are dropped and
/// slow subscribers observe `RecvError::Lagged`.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<PatrolEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: PatrolEvent) {
        let event_type = event.event_type();
        let patrol_id = event.patrol_id().to_string();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event_type, patrol_id, receivers, "Event published"),
            Err(_) => debug!(event_type, patrol_id, "Event published (no receivers)"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PatrolEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Event filter for selective subscription
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub patrol_id: Option<String>,
    pub event_types: Option<Vec<String>>,
}

impl EventFilter {
    /// Create a new empty filter (matches all events)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patrol(mut self, patrol_id: &str) -> Self {
        self.patrol_id = Some(patrol_id.to_string());
        self
    }

    pub fn types(mut self, event_types: Vec<&str>) -> Self {
        self.event_types = Some(event_types.into_iter().map(String::from).collect());
        self
    }

    pub fn matches(&self, event: &PatrolEvent) -> bool {
        if let Some(ref pid) = self.patrol_id {
            if event.patrol_id() != pid {
                return false;
            }
        }
        if let Some(ref types) = self.event_types {
            if !types.iter().any(|t| t == event.event_type()) {
                return false;
            }
        }
        true
    }
}
