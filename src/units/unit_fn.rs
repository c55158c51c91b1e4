//! # Closure-backed work unit (`UnitFn`)
//!
//! [`UnitFn`] wraps a closure `F: Fn(SharedState, CancellationToken) -> Fut`, producing a
//! fresh future per dispatch. Shared data goes through [`SharedState`] or an explicit
//! `Arc` captured by the closure.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use servicecore::{ErrorKind, SharedState, UnitFn, UnitRef, WorkUnit};
//!
//! let u: UnitRef<u64> = UnitFn::arc("answer", |_state: SharedState, ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(ErrorKind::Cancelled);
//!     }
//!     Ok::<u64, ErrorKind>(42)
//! });
//!
//! assert_eq!(u.name(), "answer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ErrorKind;
use crate::state::SharedState;
use crate::units::unit::{BoxUnitFuture, WorkUnit};

/// Function-backed work unit.
#[derive(Debug)]
pub struct UnitFn<F> {
    name: Cow<'static, str>,
    timeout: Option<Duration>,
    f: F,
}

impl<F> UnitFn<F> {
    /// Creates a new function-backed unit.
    ///
    /// Prefer [`UnitFn::arc`] when you immediately need a [`UnitRef`](crate::UnitRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            timeout: None,
            f,
        }
    }

    /// Creates the unit and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Sets a hard timeout for this unit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl<F, Fut, O> WorkUnit for UnitFn<F>
where
    F: Fn(SharedState, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, ErrorKind>> + Send + 'static,
    O: Send + 'static,
{
    type Outcome = O;

    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(&self, state: SharedState, ctx: CancellationToken) -> BoxUnitFuture<O> {
        Box::pin((self.f)(state, ctx))
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
