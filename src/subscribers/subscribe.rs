//! # `Subscribe`: consumer side of the event bus.
//!
//! Each subscriber gets its own worker task and a bounded queue inside the
//! [`SubscriberSet`](crate::SubscriberSet). A slow `on_event` only delays that
//! subscriber's queue; when the queue is full further events for it are dropped and
//! reported as `SubscriberOverflow`.

use async_trait::async_trait;

use crate::events::Event;

/// Receives supervisor and unit lifecycle events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Called once per event, in publish order for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length for this subscriber's worker.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
