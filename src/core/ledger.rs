//! # Supervisor bookkeeping.
//!
//! [`Ledger`] owns the in-flight set, the outcome counters and the lifecycle phase.
//! It is plain synchronous state: the supervisor keeps it behind a single mutex and
//! never holds that lock across an `.await`.
//!
//! ## Rules
//! - A ticket leaves the in-flight set only when its unit finished, or when the drain
//!   deadline elapsed (it then moves to the abandoned set).
//! - Each accepted ticket is counted exactly once: in one of `completed`/`failed`/
//!   `cancelled`, or as undrained in the report.
//! - Settling an abandoned ticket bumps `late` only; the issued report is frozen.
//! - Phase only moves forward: `Running → Draining → Stopped`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::time::Instant;

use crate::core::report::{DrainReport, Phase, SupervisorSnapshot, TicketId};
use crate::error::ErrorKind;

/// Terminal classification of a unit's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bucket {
    Completed,
    Failed,
    Cancelled,
}

impl Bucket {
    pub(crate) fn of<O>(res: &Result<O, ErrorKind>) -> Self {
        match res {
            Ok(_) => Bucket::Completed,
            Err(ErrorKind::Cancelled) => Bucket::Cancelled,
            Err(_) => Bucket::Failed,
        }
    }

    pub(crate) fn as_label(self) -> &'static str {
        match self {
            Bucket::Completed => "completed",
            Bucket::Failed => "failed",
            Bucket::Cancelled => "cancelled",
        }
    }
}

/// Where a settled ticket was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Settled {
    /// Counted towards the (not yet issued) drain report.
    Counted,
    /// Ticket had been abandoned; recorded as a late completion.
    Late,
    /// Ticket unknown to this ledger.
    Unknown,
}

/// Result of closing the ledger at the end of a drain.
pub(crate) struct Finished {
    pub(crate) report: DrainReport,
    /// Units abandoned by *this* call (empty when the report was already issued).
    pub(crate) abandoned: Vec<(TicketId, Arc<str>)>,
    /// True only for the call that performed `Draining → Stopped`.
    pub(crate) first: bool,
}

pub(crate) struct Ledger {
    phase: Phase,
    next_ticket: u64,
    in_flight: HashMap<TicketId, Arc<str>>,
    abandoned: HashSet<TicketId>,
    completed: usize,
    failed: usize,
    cancelled: usize,
    late: usize,
    deadline_at: Option<Instant>,
    report: Option<DrainReport>,
}

impl Ledger {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Running,
            next_ticket: 1,
            in_flight: HashMap::new(),
            abandoned: HashSet::new(),
            completed: 0,
            failed: 0,
            cancelled: 0,
            late: 0,
            deadline_at: None,
            report: None,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn deadline_at(&self) -> Option<Instant> {
        self.deadline_at
    }

    /// Registers a unit in flight. Only legal while `Running`.
    pub(crate) fn admit(&mut self, unit: &Arc<str>) -> Result<TicketId, ErrorKind> {
        if self.phase != Phase::Running {
            return Err(ErrorKind::unavailable("supervisor"));
        }
        let ticket = TicketId(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight.insert(ticket, Arc::clone(unit));
        Ok(ticket)
    }

    /// Moves `Running → Draining`. Returns false if shutdown had already begun.
    pub(crate) fn begin_drain(&mut self, deadline_at: Instant) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.phase = Phase::Draining;
        self.deadline_at = Some(deadline_at);
        true
    }

    /// Records the terminal result of a unit.
    pub(crate) fn settle(&mut self, ticket: TicketId, bucket: Bucket) -> Settled {
        if self.in_flight.remove(&ticket).is_some() {
            match bucket {
                Bucket::Completed => self.completed += 1,
                Bucket::Failed => self.failed += 1,
                Bucket::Cancelled => self.cancelled += 1,
            }
            Settled::Counted
        } else if self.abandoned.remove(&ticket) {
            self.late += 1;
            Settled::Late
        } else {
            Settled::Unknown
        }
    }

    /// Moves `Draining → Stopped`, abandoning whatever is still in flight.
    ///
    /// Calling it again returns the already-issued report unchanged.
    pub(crate) fn finish(&mut self) -> Result<Finished, ErrorKind> {
        if let Some(report) = &self.report {
            return Ok(Finished {
                report: report.clone(),
                abandoned: Vec::new(),
                first: false,
            });
        }
        if self.phase == Phase::Running {
            return Err(ErrorKind::internal(
                "supervisor",
                "wait_for_drain called before begin_shutdown",
            ));
        }

        let mut abandoned: Vec<(TicketId, Arc<str>)> = self.in_flight.drain().collect();
        abandoned.sort_unstable_by_key(|(ticket, _)| *ticket);
        self.abandoned.extend(abandoned.iter().map(|(ticket, _)| *ticket));

        let report = DrainReport {
            completed: self.completed,
            failed: self.failed,
            cancelled: self.cancelled,
            undrained: abandoned.len(),
            abandoned: abandoned.iter().map(|(ticket, _)| *ticket).collect(),
        };
        self.phase = Phase::Stopped;
        self.report = Some(report.clone());

        Ok(Finished {
            report,
            abandoned,
            first: true,
        })
    }

    pub(crate) fn snapshot(&self) -> SupervisorSnapshot {
        let mut in_flight: Vec<TicketId> = self.in_flight.keys().copied().collect();
        in_flight.sort_unstable();
        SupervisorSnapshot {
            phase: self.phase,
            in_flight,
            completed: self.completed,
            failed: self.failed,
            cancelled: self.cancelled,
            late_completions: self.late,
            unclaimed_outcomes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn admit_only_while_running() {
        let mut ledger = Ledger::new();
        let a = ledger.admit(&name("a")).unwrap();
        let b = ledger.admit(&name("b")).unwrap();
        assert!(b > a);

        assert!(ledger.begin_drain(Instant::now()));
        assert!(!ledger.begin_drain(Instant::now()));
        assert_eq!(ledger.phase(), Phase::Draining);

        assert_eq!(
            ledger.admit(&name("c")),
            Err(ErrorKind::unavailable("supervisor"))
        );
        assert_eq!(ledger.in_flight_len(), 2);
    }

    #[test]
    fn finish_before_shutdown_is_internal() {
        let mut ledger = Ledger::new();
        assert!(matches!(
            ledger.finish(),
            Err(ErrorKind::Internal { .. })
        ));
        assert_eq!(ledger.phase(), Phase::Running);
    }

    #[test]
    fn every_ticket_lands_in_one_bucket() {
        let mut ledger = Ledger::new();
        let done = ledger.admit(&name("done")).unwrap();
        let bad = ledger.admit(&name("bad")).unwrap();
        let stop = ledger.admit(&name("stop")).unwrap();
        let stuck = ledger.admit(&name("stuck")).unwrap();

        assert_eq!(ledger.settle(done, Bucket::Completed), Settled::Counted);
        assert_eq!(ledger.settle(bad, Bucket::Failed), Settled::Counted);
        ledger.begin_drain(Instant::now());
        assert_eq!(ledger.settle(stop, Bucket::Cancelled), Settled::Counted);

        let finished = ledger.finish().unwrap();
        assert_eq!(
            finished.report,
            DrainReport {
                completed: 1,
                failed: 1,
                cancelled: 1,
                undrained: 1,
                abandoned: vec![stuck],
            }
        );
        assert_eq!(finished.abandoned.len(), 1);
        assert!(finished.first);
        assert_eq!(ledger.phase(), Phase::Stopped);

        // Late completion does not touch the issued report.
        assert_eq!(ledger.settle(stuck, Bucket::Completed), Settled::Late);
        assert_eq!(ledger.settle(stuck, Bucket::Completed), Settled::Unknown);
        let again = ledger.finish().unwrap();
        assert_eq!(again.report, finished.report);
        assert!(again.abandoned.is_empty());
        assert!(!again.first);

        let snap = ledger.snapshot();
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.late_completions, 1);
        assert!(snap.in_flight.is_empty());
    }

    #[test]
    fn bucket_classification() {
        assert_eq!(Bucket::of::<()>(&Ok(())), Bucket::Completed);
        assert_eq!(Bucket::of::<()>(&Err(ErrorKind::Cancelled)), Bucket::Cancelled);
        assert_eq!(
            Bucket::of::<()>(&Err(ErrorKind::Timeout {
                elapsed: std::time::Duration::from_millis(1)
            })),
            Bucket::Failed
        );
    }
}
