//! Event broadcaster.
//!
//! The `EventBroadcaster` is the bus the object store publishes change
//! notifications on. It uses tokio's broadcast channel so every watch
//! consumer sees every event.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::ResourceEvent;

/// Default buffer size for the broadcast channel.
/// Events beyond this limit will cause older events to be dropped for slow receivers.
const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Broadcaster for object change events.
///
/// # Example
///
/// ```
/// use platform_operators_core::events::{EventBroadcaster, ResourceEvent};
///
/// let broadcaster = EventBroadcaster::new();
/// let _receiver = broadcaster.subscribe();
///
/// broadcaster.send(ResourceEvent::created("PlatformOperator", "a", serde_json::json!({})));
/// ```
#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<ResourceEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, 0 when
    /// nobody is listening.
    pub fn send(&self, event: ResourceEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Subscribe to events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
