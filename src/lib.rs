//! # servicecore
//!
//! **servicecore** is a minimal service runtime core for Rust.
//!
//! It bundles long-lived collaborators into an immutable [`ServiceState`], runs
//! cancellable [`WorkUnit`]s under a [`Supervisor`], and shuts everything down in an
//! orderly, deadline-bounded way when asked to (programmatically or by an OS signal).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   WorkUnit   │   │   WorkUnit   │   │   WorkUnit   │
//!     │  (submit #1) │   │  (submit #2) │   │  (submit #3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (Running → Draining → Stopped)                        │
//! │  - ServiceState (role → collaborator handle, read-only)           │
//! │  - Ledger (phase, in-flight tickets, outcome counters)            │
//! │  - runtime token (parent of every unit's cancellation token)      │
//! │  - Bus (broadcast events)                                         │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │   run_unit   │   │   run_unit   │   │   run_unit   │   │
//!     │ (tokio task) │   │ (tokio task) │   │ (tokio task) │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ UnitStarting     │ UnitStarting     │ UnitStarting    │ ShutdownRequested
//!      │ UnitCompleted    │ UnitCancelled    │ UnitPanicked    │ DrainCompleted
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: SupervisorConfig::bus_capacity)           │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │        listener        │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                        ┌─────────┼─────────┐
//!                        ▼         ▼         ▼
//!                     worker1   worker2   workerN
//! ```
//!
//! ### Lifecycle
//! ```text
//! ServiceState::builder().require(..).bind(..).build()   ─► Validation if a role is missing
//! state.start_all()                                        ─► collaborators up
//!
//! Supervisor::builder(cfg, state).build()                  ─► phase = Running
//!   ├─► submit(unit) ─► ticket          (Unavailable once shutdown began)
//!   ├─► await_outcome(ticket) ─► Result<O, ErrorKind>
//!   │
//!   ├─► begin_shutdown(deadline)        (first call wins; SIGINT/SIGTERM wired here)
//!   │       └─► phase = Draining, cancel every unit's token
//!   │
//!   └─► wait_for_drain()
//!           ├─ all units done before deadline ─► DrainReport { undrained: 0 }
//!           └─ deadline elapsed                ─► DrainReport { undrained: N }, abandoned units
//!                                                 keep running; late results are recorded
//!       phase = Stopped
//!
//! state.stop_all()                                         ─► collaborators down
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                         |
//! |-------------------|-------------------------------------------------------------------|--------------------------------------------|
//! | **State**         | Role-keyed, immutable bundle of collaborators.                    | [`ServiceState`], [`Collaborator`]         |
//! | **Units**         | Cancellable units of work, as trait impls or closures.            | [`WorkUnit`], [`UnitFn`], [`UnitRef`]      |
//! | **Supervision**   | Submit, await, shut down and drain.                               | [`Supervisor`], [`DrainReport`]            |
//! | **Errors**        | One closed error taxonomy for every public operation.             | [`ErrorKind`]                              |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom subscribers).| [`Subscribe`], [`Event`]                   |
//! | **Configuration** | Drain grace, concurrency limit, default unit timeout.             | [`SupervisorConfig`]                       |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber that forwards events to `tracing`.
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
//!     let sup = Supervisor::<()>::builder(SupervisorConfig::default(), state).build()?;
//!
//!     // Runs until cancelled.
//!     let worker = UnitFn::new("worker", |_s: SharedState, ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Err::<(), ErrorKind>(ErrorKind::Cancelled)
//!     });
//!     let ticket = sup.submit(worker)?;
//!
//!     sup.begin_shutdown(Duration::from_secs(1));
//!     let report = sup.wait_for_drain().await?;
//!     assert_eq!(report.cancelled, 1);
//!     assert_eq!(report.undrained, 0);
//!     assert_eq!(sup.await_outcome(ticket).await, Err(ErrorKind::Cancelled));
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod state;
mod subscribers;
mod units;

// ---- Public re-exports ----

pub use core::{
    DrainReport, Phase, Supervisor, SupervisorBuilder, SupervisorConfig, SupervisorSnapshot,
    TicketId, wait_for_shutdown_signal,
};
pub use error::ErrorKind;
pub use events::{Event, EventKind};
pub use state::{Collaborator, ServiceState, ServiceStateBuilder, SharedState};
pub use subscribers::{Subscribe, SubscriberSet};
pub use units::{BoxUnitFuture, UnitFn, UnitRef, WorkUnit, until_cancelled};

// Optional: a built-in subscriber that forwards events to `tracing`.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
