//! # Runtime events emitted by the supervisor and the dispatch runner.
//!
//! [`EventKind`] falls into three groups:
//! - **Unit events**: per-unit flow (submitted, starting, completed, failed, ...)
//! - **Shutdown events**: shutdown requested, drain completed or deadline exceeded
//! - **Subscriber events**: overflow and panic reports from subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, ticket,
//! unit name, reasons, and elapsed time.
//!
//! ## Ordering
//! `seq` comes from a process-wide counter. Subscribers run on separate workers, so
//! sort by `seq` when merging what several of them saw.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use servicecore::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::UnitFailed)
//!     .with_ticket(3)
//!     .with_unit("sync-orders")
//!     .with_reason("storage unavailable")
//!     .with_elapsed(Duration::from_millis(40));
//!
//! assert_eq!(ev.kind, EventKind::UnitFailed);
//! assert_eq!(ev.unit.as_deref(), Some("sync-orders"));
//! assert_eq!(ev.elapsed_ms, Some(40));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `unit`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested; cancellation broadcast to all in-flight units.
    ///
    /// Sets:
    /// - `elapsed_ms`: configured drain deadline (ms)
    ShutdownRequested,

    /// Every in-flight unit finished before the drain deadline.
    DrainCompleted,

    /// Drain deadline elapsed with units still running.
    ///
    /// Sets:
    /// - `reason`: summary of the undrained count
    DrainDeadlineExceeded,

    // === Unit events ===
    /// Unit accepted and registered in flight.
    ///
    /// Sets:
    /// - `ticket`, `unit`
    UnitSubmitted,

    /// Submission refused because the supervisor is no longer running.
    ///
    /// Sets:
    /// - `unit`
    /// - `reason`: current phase
    UnitRejected,

    /// Unit acquired its slot and is about to run.
    ///
    /// Sets:
    /// - `ticket`, `unit`
    UnitStarting,

    /// Unit returned a success value.
    ///
    /// Sets:
    /// - `ticket`, `unit`, `elapsed_ms`
    UnitCompleted,

    /// Unit returned an error other than cancellation.
    ///
    /// Sets:
    /// - `ticket`, `unit`, `elapsed_ms`
    /// - `reason`: error message
    UnitFailed,

    /// Unit observed cancellation and stopped.
    ///
    /// Sets:
    /// - `ticket`, `unit`, `elapsed_ms`
    UnitCancelled,

    /// Unit exceeded its hard timeout (always followed by `UnitFailed`).
    ///
    /// Sets:
    /// - `ticket`, `unit`
    /// - `elapsed_ms`: the timeout that elapsed
    UnitTimedOut,

    /// Unit panicked; caught at the dispatch boundary (always followed by `UnitFailed`).
    ///
    /// Sets:
    /// - `ticket`, `unit`
    /// - `reason`: panic payload
    UnitPanicked,

    /// Unit was still running when the drain deadline elapsed; it is no longer tracked.
    ///
    /// Sets:
    /// - `ticket`, `unit`
    UnitAbandoned,

    /// A previously abandoned unit finished after the drain report was issued.
    ///
    /// Sets:
    /// - `ticket`, `unit`
    /// - `reason`: outcome label
    LateCompletion,
}

/// One published event. Which optional fields are filled depends on [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Ticket of the unit, if applicable.
    pub ticket: Option<u64>,
    /// Name of the unit (or subscriber), if applicable.
    pub unit: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Elapsed or configured duration in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            ticket: None,
            unit: None,
            reason: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a ticket number.
    #[inline]
    pub fn with_ticket(mut self, ticket: u64) -> Self {
        self.ticket = Some(ticket);
        self
    }

    /// Attaches a unit name.
    #[inline]
    pub fn with_unit(mut self, unit: impl Into<Arc<str>>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a duration (stored as milliseconds, saturating).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_unit(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_unit(subscriber)
            .with_reason(info)
    }

    /// Returns true for `SubscriberOverflow`.
    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::UnitSubmitted);
        let b = Event::new(EventKind::UnitStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn elapsed_saturates() {
        let ev = Event::new(EventKind::UnitTimedOut).with_elapsed(Duration::from_secs(u64::MAX));
        assert_eq!(ev.elapsed_ms, Some(u32::MAX));
    }
}
