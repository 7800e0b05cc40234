use crate::constants::DEFAULT_EVENT_CHANNEL_CAPACITY;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

/// Broadcast publisher for publishing lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<LifecycleEvent>,
}

/// Event emitted after a transition or scheduler outcome
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleEvent {
    pub name: String,
    pub context: Value,
    pub published_at: DateTime<Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event and return how many subscribers received it.
    ///
    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, name: impl Into<String>, context: Value) -> usize {
        let event = LifecycleEvent {
            name: name.into(),
            context,
            published_at: Utc::now(),
        };

        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let publisher = EventPublisher::new(8);
        assert_eq!(publisher.publish("nobody.listens", Value::Null), 0);

        let mut receiver = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);
        assert_eq!(
            publisher.publish("language.published", serde_json::json!({"language": "fi"})),
            1
        );

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, "language.published");
        assert_eq!(event.context["language"], "fi");
    }
}
