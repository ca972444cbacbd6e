//! Engine events — a complete, ordered log of what the engine did.
//!
//! The watch channels on [`ConversationEngine`](crate::ConversationEngine)
//! only keep the latest value; a slow observer can miss intermediate
//! states. The event bus delivers every history change and every state
//! transition, which is what a renderer replaying the console or a test
//! asserting on transitions needs.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;
use vigil_core::history::HistorySnapshot;

use crate::state::PipelineState;

/// Everything the engine publishes.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// History changed; carries the snapshot taken right after the mutation.
    HistoryChanged { snapshot: HistorySnapshot },

    /// A pipeline entered a new state.
    StateChanged {
        pipeline_id: Uuid,
        state: PipelineState,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for engine events.
pub struct EventBus {
    sender: broadcast::Sender<Arc<EngineEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<EngineEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::history::History;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(EngineEvent::StateChanged {
            pipeline_id: Uuid::new_v4(),
            state: PipelineState::Scanning,
            timestamp: Utc::now(),
        });
        bus.publish(EngineEvent::HistoryChanged {
            snapshot: History::new().snapshot(),
        });

        match rx.recv().await.unwrap().as_ref() {
            EngineEvent::StateChanged { state, .. } => assert_eq!(*state, PipelineState::Scanning),
            other => panic!("Expected StateChanged, got {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap().as_ref(),
            EngineEvent::HistoryChanged { .. }
        ));
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::default();
        bus.publish(EngineEvent::HistoryChanged {
            snapshot: History::new().snapshot(),
        });
    }
}
