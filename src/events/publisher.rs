use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::constants::defaults;
use crate::orchestration::async_task::AsyncTaskKey;

/// Broadcast publisher for async task lifecycle events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl PublishedEvent {
    /// The task key carried in the context, when the event is about one task
    pub fn task_key(&self) -> Option<AsyncTaskKey> {
        serde_json::from_value(self.context.get("task")?.clone()).ok()
    }
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event with the given name and context
    pub async fn publish(
        &self,
        event_name: impl Into<String>,
        context: Value,
    ) -> Result<(), PublishError> {
        let event = PublishedEvent {
            name: event_name.into(),
            context,
            published_at: chrono::Utc::now(),
        };

        // No subscribers is not an error
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Publish an event about one task, merging `details` into the context
    pub async fn publish_task_event(
        &self,
        event_name: &str,
        key: &AsyncTaskKey,
        details: Value,
    ) -> Result<(), PublishError> {
        let mut context = json!({ "task": serde_json::to_value(key)? });
        if let (Some(target), Value::Object(extra)) = (context.as_object_mut(), details) {
            target.extend(extra);
        }
        self.publish(event_name, context).await
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
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
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(defaults::EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::events;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::default();
        assert_eq!(publisher.subscriber_count(), 0);
        publisher
            .publish(events::ASYNC_TASK_STARTED, json!({}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_task_event_carries_key_and_details() {
        let publisher = EventPublisher::new(8);
        let mut receiver = publisher.subscribe();
        let key = AsyncTaskKey::new(10, 20);

        publisher
            .publish_task_event(
                events::ASYNC_TASK_FAILED,
                &key,
                json!({ "reason": "child failed" }),
            )
            .await
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, events::ASYNC_TASK_FAILED);
        assert_eq!(event.task_key(), Some(key));
        assert_eq!(event.context["reason"], "child failed");
    }
}
