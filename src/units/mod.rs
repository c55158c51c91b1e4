//! # Work units.
//!
//! - [`WorkUnit`] - trait for a cancellable unit of work against [`SharedState`](crate::SharedState)
//! - [`UnitFn`] - closure-backed implementation
//! - [`UnitRef`] - shared reference to a unit (`Arc<dyn WorkUnit>`)
//! - [`until_cancelled`] - races a suspension point against the cancellation token

mod unit;
mod unit_fn;

pub use unit::{BoxUnitFuture, UnitRef, WorkUnit, until_cancelled};
pub use unit_fn::UnitFn;
