//! # Event bus.
//!
//! [`Bus`] wraps a [`tokio::sync::broadcast`] sender. The supervisor, every dispatch runner
//! and the subscriber workers publish into it; the supervisor's listener is its only
//! long-lived receiver and forwards to [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//!   Supervisor ─┐
//!   run_unit  ──┼──► Bus ──► listener ──► SubscriberSet
//!   workers   ──┘
//! ```
//!
//! Publishing never waits. Once the ring buffer is full the oldest events are overwritten
//! and a slow receiver sees `RecvError::Lagged(n)`; the listener skips past the gap.
//! Events published while nobody is subscribed are discarded.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable, non-blocking publisher of runtime [`Event`]s.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus whose ring buffer holds `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to current receivers; dropped silently if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// New receiver observing only events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_events_published_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ShutdownRequested));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::DrainCompleted));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::DrainCompleted);
    }

    #[tokio::test]
    async fn lagging_receiver_skips_oldest() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.publish(Event::new(EventKind::UnitSubmitted));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::UnitSubmitted);
    }
}
