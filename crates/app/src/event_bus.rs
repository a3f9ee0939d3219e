//! Fan-out of domain events to in-process listeners.
//!
//! The SSE endpoint is the main consumer: every open stream holds one
//! receiver. A listener that falls more than the channel capacity behind
//! skips the oldest events and observes a `Lagged` error instead.

use std::future::Future;

use tokio::sync::broadcast;

use litehub_domain::error::LiteHubError;
use litehub_domain::event::Event;

use crate::ports::EventPublisher;

/// Events buffered per listener before the slowest one starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

/// [`EventPublisher`] over a tokio [`broadcast`] channel.
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl InProcessEventBus {
    /// Bus buffering up to `capacity` events per listener.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Start listening. Only events published from now on are received.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listeners(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), LiteHubError>> + Send {
        let event_type = event.event_type;
        match self.sender.send(event) {
            Ok(delivered) => tracing::trace!(?event_type, delivered, "event published"),
            Err(_) => tracing::trace!(?event_type, "event dropped, nobody listening"),
        }
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litehub_domain::event::EventType;
    use litehub_domain::id::EntityId;
    use tokio::sync::broadcast::error::RecvError;

    fn switched(to: &str) -> Event {
        Event::new(
            EventType::StateChanged,
            Some(EntityId::new()),
            serde_json::json!({"entity_id": "switch.litetouch_12_3", "to": to}),
        )
    }

    #[tokio::test]
    async fn should_fan_out_to_every_listener_in_order() {
        let bus = InProcessEventBus::default();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.listeners(), 2);

        bus.publish(switched("on")).await.unwrap();
        bus.publish(switched("off")).await.unwrap();

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap().data["to"], "on");
            assert_eq!(rx.recv().await.unwrap().data["to"], "off");
        }
    }

    #[tokio::test]
    async fn should_accept_events_while_nobody_listens() {
        let bus = InProcessEventBus::default();
        assert_eq!(bus.listeners(), 0);

        bus.publish(switched("on")).await.unwrap();

        let mut late = bus.subscribe();
        bus.publish(switched("off")).await.unwrap();
        assert_eq!(late.recv().await.unwrap().data["to"], "off");
    }

    #[tokio::test]
    async fn should_report_lag_to_a_slow_listener() {
        let bus = InProcessEventBus::new(2);
        let mut slow = bus.subscribe();

        for to in ["on", "off", "on"] {
            bus.publish(switched(to)).await.unwrap();
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(1))));
        assert_eq!(slow.recv().await.unwrap().data["to"], "off");
    }

    #[tokio::test]
    async fn should_forget_listeners_once_dropped() {
        let bus = InProcessEventBus::default();
        let rx = bus.subscribe();
        assert_eq!(bus.listeners(), 1);

        drop(rx);
        assert_eq!(bus.listeners(), 0);
    }
}
