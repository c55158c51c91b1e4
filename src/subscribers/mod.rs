//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and the
//! optional built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Runner/Supervisor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                                  │
//!                                                   ┌──────────────┼──────────────┐
//!                                                   ▼              ▼              ▼
//!                                               LogWriter       Metrics        Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use servicecore::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Abandoned;
//!
//! #[async_trait]
//! impl Subscribe for Abandoned {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::UnitAbandoned {
//!             // page someone
//!         }
//!     }
//!     fn name(&self) -> &'static str { "abandoned" }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
