//! Public value types describing supervisor progress: tickets, phases, reports.

use std::fmt;

/// Identifier handed out by [`Supervisor::submit`](crate::Supervisor::submit).
///
/// Tickets are unique per supervisor and increase in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TicketId(pub(crate) u64);

impl TicketId {
    /// Raw numeric value (for logs and correlation).
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Supervisor lifecycle phase: `Running → Draining → Stopped`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting submissions.
    Running,
    /// Shutdown begun; cancellation broadcast, no new work accepted.
    Draining,
    /// Drain finished (or its deadline elapsed); terminal.
    Stopped,
}

impl Phase {
    /// Short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Stopped => "stopped",
        }
    }
}

/// Aggregate outcome of a drain.
///
/// Every unit accepted by the supervisor lands in exactly one bucket.
/// Units still running when the deadline elapsed are counted as `undrained`
/// and listed in `abandoned`; their later completion does not change the report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Units that returned a success value.
    pub completed: usize,
    /// Units that returned an error other than cancellation (including panics and timeouts).
    pub failed: usize,
    /// Units that returned `Cancelled`.
    pub cancelled: usize,
    /// Units still running when the drain deadline elapsed.
    pub undrained: usize,
    /// Tickets of the undrained units.
    pub abandoned: Vec<TicketId>,
}

impl DrainReport {
    /// Total number of units accounted for.
    pub fn total(&self) -> usize {
        self.completed + self.failed + self.cancelled + self.undrained
    }

    /// True when nothing was left running at the deadline.
    pub fn is_clean(&self) -> bool {
        self.undrained == 0
    }

    /// Suggested process exit status.
    ///
    /// - `2` if any unit was left undrained
    /// - `1` if any unit failed
    /// - `0` otherwise
    pub fn exit_code(&self) -> i32 {
        if self.undrained > 0 {
            2
        } else if self.failed > 0 {
            1
        } else {
            0
        }
    }
}

/// Point-in-time view of the supervisor's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSnapshot {
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Tickets currently tracked as in flight, sorted.
    pub in_flight: Vec<TicketId>,
    /// Units completed successfully so far.
    pub completed: usize,
    /// Units failed so far.
    pub failed: usize,
    /// Units cancelled so far.
    pub cancelled: usize,
    /// Abandoned units that finished after the drain report was issued.
    pub late_completions: usize,
    /// Outcomes retained for tickets nobody has awaited or forgotten yet.
    pub unclaimed_outcomes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_prefers_undrained() {
        let mut report = DrainReport {
            completed: 3,
            failed: 1,
            ..DrainReport::default()
        };
        assert_eq!(report.exit_code(), 1);
        assert!(report.is_clean());

        report.undrained = 1;
        report.abandoned = vec![TicketId(7)];
        assert_eq!(report.exit_code(), 2);
        assert_eq!(report.total(), 5);
        assert!(!report.is_clean());
    }

    #[test]
    fn ticket_display() {
        assert_eq!(TicketId(12).to_string(), "unit#12");
    }
}
