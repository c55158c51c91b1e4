//! # Supervisor: dispatches work units, tracks them, and drains on shutdown.
//!
//! The [`Supervisor`] owns the shared [`ServiceState`](crate::ServiceState), the event bus,
//! a [`SubscriberSet`], the runtime cancellation token and the bookkeeping ledger.
//! It is the only component with concurrency-coordination logic.
//!
//! ## Key responsibilities
//! - accept units while `Running`, reject with `Unavailable` afterwards
//! - dispatch each accepted unit on the Tokio runtime with a child cancellation token
//! - catch panics at the dispatch boundary and record them as failures
//! - on shutdown, broadcast cancellation and wait (bounded) for in-flight units
//!
//! ## High-level architecture
//! ```text
//! submit(unit)
//!   └─► lock ledger ─► admit (phase check, ticket, in-flight insert) ─► unlock
//!         └─► tokio::spawn(run_unit(dispatch)) ─► settle(ticket) ─► oneshot → await_outcome
//!
//! begin_shutdown(deadline)
//!   └─► lock ledger ─► Running → Draining (first call only) ─► unlock
//!         └─► runtime_token.cancel()   → propagates to every unit's child token
//!
//! wait_for_drain()
//!   └─► wait until in-flight == 0 or deadline
//!         └─► lock ledger ─► Draining → Stopped, abandon leftovers ─► DrainReport
//!               ├─ nothing left     → publish DrainCompleted
//!               └─ units still run  → publish UnitAbandoned × N, DrainDeadlineExceeded
//! ```
//!
//! ## Rules
//! - Ledger mutations are serialized under one mutex and never suspend.
//! - Cancellation is cooperative: units are asked to stop, never aborted.
//! - The drain deadline bounds the *wait*, not the units. A unit that finishes after
//!   being abandoned is recorded as a late completion; the issued report never changes.
//! - Nothing is retried here.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use servicecore::{ErrorKind, ServiceState, SharedState, Supervisor, SupervisorConfig, UnitFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), ErrorKind> {
//!     let state = ServiceState::builder().build()?;
//!     let sup = Supervisor::<u32>::builder(SupervisorConfig::default(), state).build()?;
//!
//!     let ticket = sup.submit(UnitFn::new("two", |_s: SharedState, _c: CancellationToken| async {
//!         Ok::<u32, ErrorKind>(2)
//!     }))?;
//!     assert_eq!(sup.await_outcome(ticket).await?, 2);
//!
//!     sup.begin_shutdown(Duration::from_secs(1));
//!     let report = sup.wait_for_drain().await?;
//!     assert_eq!(report.completed, 1);
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{Semaphore, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::builder::SupervisorBuilder;
use crate::core::config::SupervisorConfig;
use crate::core::ledger::{Bucket, Ledger, Settled};
use crate::core::report::{DrainReport, Phase, SupervisorSnapshot, TicketId};
use crate::core::runner::{Dispatch, run_unit};
use crate::error::ErrorKind;
use crate::events::{Bus, Event, EventKind};
use crate::state::SharedState;
use crate::subscribers::SubscriberSet;
use crate::units::{UnitRef, WorkUnit};

type OutcomeRx<O> = oneshot::Receiver<Result<O, ErrorKind>>;

/// Used when `now + deadline` overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Ledger plus pending outcome receivers, behind a single mutex.
struct Inner<O> {
    ledger: Ledger,
    outcomes: HashMap<TicketId, OutcomeRx<O>>,
}

/// Shared between the supervisor and every dispatched unit.
struct Book<O> {
    inner: Mutex<Inner<O>>,
    /// Mirrors the in-flight count so drains can wait without polling.
    in_flight: watch::Sender<usize>,
}

impl<O> Book<O> {
    fn lock(&self) -> MutexGuard<'_, Inner<O>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, ticket: TicketId, name: &Arc<str>, bucket: Bucket, bus: &Bus) {
        let settled = {
            let mut inner = self.lock();
            let settled = inner.ledger.settle(ticket, bucket);
            self.in_flight.send_replace(inner.ledger.in_flight_len());
            settled
        };

        match settled {
            Settled::Late => bus.publish(
                Event::new(EventKind::LateCompletion)
                    .with_ticket(ticket.get())
                    .with_unit(Arc::clone(name))
                    .with_reason(bucket.as_label()),
            ),
            Settled::Counted | Settled::Unknown => {}
        }
    }
}

/// Coordinates dispatch, tracking and shutdown of work units producing `O`.
pub struct Supervisor<O> {
    cfg: SupervisorConfig,
    state: SharedState,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    runtime: Handle,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
    semaphore: Option<Arc<Semaphore>>,
    book: Arc<Book<O>>,
}

impl<O> Supervisor<O>
where
    O: Send + 'static,
{
    /// Starts building a supervisor over `state`.
    pub fn builder(cfg: SupervisorConfig, state: impl Into<SharedState>) -> SupervisorBuilder<O> {
        SupervisorBuilder::new(cfg, state.into())
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        state: SharedState,
        runtime: Handle,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        listener_token: CancellationToken,
        listener: JoinHandle<()>,
    ) -> Self {
        let semaphore = cfg
            .concurrency_limit()
            .map(Semaphore::new)
            .map(Arc::new);
        let (in_flight, _) = watch::channel(0usize);

        Self {
            cfg,
            state,
            bus,
            subs,
            runtime,
            runtime_token: CancellationToken::new(),
            listener_token,
            listener: Mutex::new(Some(listener)),
            semaphore,
            book: Arc::new(Book {
                inner: Mutex::new(Inner {
                    ledger: Ledger::new(),
                    outcomes: HashMap::new(),
                }),
                in_flight,
            }),
        }
    }

    /// Submits a unit for concurrent execution.
    ///
    /// Accepted only while [`Phase::Running`]; afterwards fails with
    /// `Unavailable { role: "supervisor" }` without blocking.
    /// May be called from any thread; the unit runs on the runtime the supervisor was built on.
    pub fn submit<U>(&self, unit: U) -> Result<TicketId, ErrorKind>
    where
        U: WorkUnit<Outcome = O>,
    {
        self.submit_ref(Arc::new(unit))
    }

    /// Same as [`submit`](Self::submit) for an already shared unit.
    pub fn submit_ref(&self, unit: UnitRef<O>) -> Result<TicketId, ErrorKind> {
        self.dispatch(unit, true)
    }

    /// Submits a fire-and-forget unit.
    ///
    /// The unit is tracked and counted like any other, but its outcome is not retained:
    /// [`await_outcome`](Self::await_outcome) on the returned ticket fails with `Validation`.
    pub fn submit_detached<U>(&self, unit: U) -> Result<TicketId, ErrorKind>
    where
        U: WorkUnit<Outcome = O>,
    {
        self.dispatch(Arc::new(unit), false)
    }

    /// Drops the retained outcome of `ticket` without waiting for it.
    ///
    /// Returns false if the ticket is unknown, detached or already awaited.
    pub fn forget(&self, ticket: TicketId) -> bool {
        self.book.lock().outcomes.remove(&ticket).is_some()
    }

    fn dispatch(&self, unit: UnitRef<O>, retain: bool) -> Result<TicketId, ErrorKind> {
        let name: Arc<str> = Arc::from(unit.name());

        let (tx, rx) = oneshot::channel();
        let admitted = {
            let mut inner = self.book.lock();
            match inner.ledger.admit(&name) {
                Ok(ticket) => {
                    if retain {
                        inner.outcomes.insert(ticket, rx);
                    }
                    self.book.in_flight.send_replace(inner.ledger.in_flight_len());
                    Ok(ticket)
                }
                Err(err) => Err((err, inner.ledger.phase())),
            }
        };

        let ticket = match admitted {
            Ok(ticket) => ticket,
            Err((err, phase)) => {
                self.bus.publish(
                    Event::new(EventKind::UnitRejected)
                        .with_unit(name)
                        .with_reason(phase.as_label()),
                );
                return Err(err);
            }
        };

        self.bus.publish(
            Event::new(EventKind::UnitSubmitted)
                .with_ticket(ticket.get())
                .with_unit(Arc::clone(&name)),
        );

        let timeout = unit.timeout().or(self.cfg.default_unit_timeout());
        let dispatch = Dispatch {
            ticket,
            name: Arc::clone(&name),
            unit,
            state: Arc::clone(&self.state),
            ctx: self.runtime_token.child_token(),
            timeout,
            semaphore: self.semaphore.clone(),
        };
        let book = Arc::clone(&self.book);
        let bus = self.bus.clone();

        self.runtime.spawn(async move {
            let res = run_unit(dispatch, &bus).await;
            book.settle(ticket, &name, Bucket::of(&res), &bus);
            let _ = tx.send(res);
        });

        Ok(ticket)
    }

    /// Waits for the unit behind `ticket` to finish and returns what it produced.
    ///
    /// Each ticket's outcome can be taken once; an unknown, detached, forgotten or
    /// already awaited ticket fails with `Validation`.
    pub async fn await_outcome(&self, ticket: TicketId) -> Result<O, ErrorKind> {
        let rx = self.book.lock().outcomes.remove(&ticket).ok_or_else(|| {
            ErrorKind::validation(format!("unknown or already awaited ticket {ticket}"))
        })?;

        match rx.await {
            Ok(res) => res,
            Err(_closed) => Err(ErrorKind::internal(
                "supervisor",
                format!("{ticket} dropped before reporting an outcome"),
            )),
        }
    }

    /// Begins graceful shutdown: `Running → Draining`, then broadcasts cancellation.
    ///
    /// Idempotent; only the first call has an effect and returns `true`.
    /// Returns immediately.
    pub fn begin_shutdown(&self, deadline: Duration) -> bool {
        let first = self
            .book
            .lock()
            .ledger
            .begin_drain(deadline_from_now(deadline));

        if first {
            self.bus
                .publish(Event::new(EventKind::ShutdownRequested).with_elapsed(deadline));
            self.runtime_token.cancel();
        }
        first
    }

    /// Waits until every in-flight unit finished or the shutdown deadline elapsed.
    ///
    /// Moves `Draining → Stopped` and returns the [`DrainReport`]. Units still running
    /// at the deadline are reported as undrained and dropped from tracking (not killed).
    /// Calling it before [`begin_shutdown`](Self::begin_shutdown) is an `Internal` error;
    /// calling it again returns the same report.
    pub async fn wait_for_drain(&self) -> Result<DrainReport, ErrorKind> {
        let deadline_at = self.book.lock().ledger.deadline_at().ok_or_else(|| {
            ErrorKind::internal("supervisor", "wait_for_drain called before begin_shutdown")
        })?;

        let mut rx = self.book.in_flight.subscribe();
        let _ = time::timeout_at(deadline_at, async move {
            let _ = rx.wait_for(|n| *n == 0).await;
        })
        .await;

        let finished = {
            let mut inner = self.book.lock();
            let finished = inner.ledger.finish()?;
            self.book.in_flight.send_replace(inner.ledger.in_flight_len());
            finished
        };

        if finished.first {
            for (ticket, name) in &finished.abandoned {
                self.bus.publish(
                    Event::new(EventKind::UnitAbandoned)
                        .with_ticket(ticket.get())
                        .with_unit(Arc::clone(name)),
                );
            }
            if finished.report.is_clean() {
                self.bus.publish(Event::new(EventKind::DrainCompleted));
            } else {
                self.bus.publish(
                    Event::new(EventKind::DrainDeadlineExceeded)
                        .with_reason(format!("undrained={}", finished.report.undrained)),
                );
            }
        }

        Ok(finished.report)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.book.lock().ledger.phase()
    }

    /// Point-in-time view of the bookkeeping.
    pub fn snapshot(&self) -> SupervisorSnapshot {
        let inner = self.book.lock();
        let mut snap = inner.ledger.snapshot();
        snap.unclaimed_outcomes = inner.outcomes.len();
        snap
    }

    /// Delivers every event published so far to the subscribers, then stops them.
    ///
    /// Call it at teardown, after [`wait_for_drain`](Self::wait_for_drain); events
    /// published afterwards are not delivered.
    pub async fn shutdown_subscribers(&self) {
        self.listener_token.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }
        self.subs.shutdown().await;
    }

    /// The shared service state handed to every unit.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// The configuration this supervisor was built with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subs.len()
    }

    /// Token cancelled when shutdown begins.
    pub(crate) fn runtime_token(&self) -> &CancellationToken {
        &self.runtime_token
    }
}

impl<O> Drop for Supervisor<O> {
    fn drop(&mut self) {
        self.listener_token.cancel();
    }
}

/// Converts a relative deadline into an instant, saturating far in the future.
fn deadline_from_now(deadline: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(deadline)
        .unwrap_or_else(|| now + FAR_FUTURE)
}
