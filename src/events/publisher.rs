use crate::events::envelope::EventEnvelope;
use tokio::sync::broadcast;

/// High-throughput publisher for registry change events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an envelope to all subscribers
    pub async fn publish(&self, envelope: EventEnvelope) -> Result<(), PublishError> {
        // For broadcast channels, send() returns an error if there are no subscribers.
        // We want to publish events even if no one is listening.
        match self.sender.send(envelope) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event channel is closed")]
    ChannelClosed,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
