//! Runtime core: dispatch, bookkeeping and shutdown.
//!
//! The public API from this module is [`Supervisor`] plus the value types it hands out.
//!
//! Internal modules:
//! - [`supervisor`]: submit/await/shutdown/drain;
//! - [`builder`]: wires bus, subscribers and listener;
//! - [`ledger`]: phase, in-flight set and counters under one lock;
//! - [`runner`]: runs one unit with slot, timeout, panic isolation and event publishing;
//! - [`shutdown`]: OS signal handling and signal-to-shutdown wiring;
//! - [`report`]: tickets, phases and drain reports;
//! - [`config`]: supervisor settings.

mod builder;
mod config;
mod ledger;
mod report;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use report::{DrainReport, Phase, SupervisorSnapshot, TicketId};
pub use shutdown::wait_for_shutdown_signal;
pub use supervisor::Supervisor;

pub(crate) use runner::panic_message;
