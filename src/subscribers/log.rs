//! # LogWriter: events as `tracing` records
//!
//! A subscriber that renders incoming [`Event`]s as `tracing` records. Installing a
//! sink (e.g. `tracing_subscriber::fmt`) is left to the host process.
//!
//! ## Levels
//! - `debug`: submitted, starting, completed, cancelled
//! - `info`: shutdown requested, drain completed
//! - `warn`: failed, timed out, rejected, abandoned, late completion, deadline exceeded,
//!   subscriber overflow
//! - `error`: unit or subscriber panics

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let unit = e.unit.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::UnitSubmitted => {
                debug!(seq = e.seq, ticket = ?e.ticket, unit, "unit submitted");
            }
            EventKind::UnitStarting => {
                debug!(seq = e.seq, ticket = ?e.ticket, unit, "unit starting");
            }
            EventKind::UnitCompleted => {
                debug!(seq = e.seq, ticket = ?e.ticket, unit, elapsed_ms = ?e.elapsed_ms, "unit completed");
            }
            EventKind::UnitCancelled => {
                debug!(seq = e.seq, ticket = ?e.ticket, unit, elapsed_ms = ?e.elapsed_ms, "unit cancelled");
            }
            EventKind::UnitRejected => {
                warn!(seq = e.seq, unit, reason, "unit rejected");
            }
            EventKind::UnitFailed => {
                warn!(seq = e.seq, ticket = ?e.ticket, unit, reason, elapsed_ms = ?e.elapsed_ms, "unit failed");
            }
            EventKind::UnitTimedOut => {
                warn!(seq = e.seq, ticket = ?e.ticket, unit, timeout_ms = ?e.elapsed_ms, "unit timed out");
            }
            EventKind::UnitPanicked => {
                error!(seq = e.seq, ticket = ?e.ticket, unit, reason, "unit panicked");
            }
            EventKind::UnitAbandoned => {
                warn!(seq = e.seq, ticket = ?e.ticket, unit, "unit still running after drain deadline; abandoned");
            }
            EventKind::LateCompletion => {
                warn!(seq = e.seq, ticket = ?e.ticket, unit, outcome = reason, "abandoned unit finished late");
            }
            EventKind::ShutdownRequested => {
                info!(seq = e.seq, deadline_ms = ?e.elapsed_ms, "shutdown requested");
            }
            EventKind::DrainCompleted => {
                info!(seq = e.seq, "all units drained");
            }
            EventKind::DrainDeadlineExceeded => {
                warn!(seq = e.seq, reason, "drain deadline exceeded");
            }
            EventKind::SubscriberOverflow => {
                warn!(seq = e.seq, subscriber = unit, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(seq = e.seq, subscriber = unit, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
