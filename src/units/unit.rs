//! # Work unit abstraction.
//!
//! A [`WorkUnit`] describes *what to do*: given the shared service state and a
//! cancellation token it produces a future yielding `Result<Outcome, ErrorKind>`.
//! The supervisor decides *when* it runs.
//!
//! Units must observe cancellation at every suspension point they create. The
//! [`until_cancelled`] helper is the usual way to do that.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ErrorKind;
use crate::state::SharedState;

/// Boxed future returned by [`WorkUnit::spawn`].
pub type BoxUnitFuture<O> = Pin<Box<dyn Future<Output = Result<O, ErrorKind>> + Send + 'static>>;

/// Shared handle to a unit producing `O`.
pub type UnitRef<O> = Arc<dyn WorkUnit<Outcome = O>>;

/// # Asynchronous, cancellable unit of work.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use servicecore::{BoxUnitFuture, ErrorKind, SharedState, WorkUnit};
///
/// struct Count(u32);
///
/// impl WorkUnit for Count {
///     type Outcome = u32;
///
///     fn name(&self) -> &str { "count" }
///
///     fn spawn(&self, _state: SharedState, ctx: CancellationToken) -> BoxUnitFuture<u32> {
///         let n = self.0;
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(ErrorKind::Cancelled);
///             }
///             Ok(n)
///         })
///     }
/// }
/// ```
pub trait WorkUnit: Send + Sync + 'static {
    /// Value produced on success.
    type Outcome: Send + 'static;

    /// Stable, human-readable name used for logging and correlation.
    fn name(&self) -> &str;

    /// Creates the future that performs the work.
    ///
    /// The future must return [`ErrorKind::Cancelled`] once it observes `ctx`
    /// cancelled, and must convert collaborator failures into an [`ErrorKind`].
    fn spawn(&self, state: SharedState, ctx: CancellationToken) -> BoxUnitFuture<Self::Outcome>;

    /// Optional hard timeout for this unit; `None` falls back to the supervisor default.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Awaits `fut` unless `ctx` is cancelled first.
///
/// Returns [`ErrorKind::Cancelled`] if the token fires before (or while) the future
/// is pending. An already-cancelled token wins even if `fut` is immediately ready.
///
/// # Example
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use servicecore::{ErrorKind, until_cancelled};
///
/// let ctx = CancellationToken::new();
/// ctx.cancel();
/// let res = until_cancelled(&ctx, tokio::time::sleep(Duration::from_secs(60))).await;
/// assert_eq!(res, Err(ErrorKind::Cancelled));
/// # }
/// ```
pub async fn until_cancelled<F>(ctx: &CancellationToken, fut: F) -> Result<F::Output, ErrorKind>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ErrorKind::Cancelled),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_future_passes_through() {
        let ctx = CancellationToken::new();
        assert_eq!(until_cancelled(&ctx, async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_future() {
        let ctx = CancellationToken::new();
        let child = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });
        let res = until_cancelled(&ctx, std::future::pending::<()>()).await;
        assert_eq!(res, Err(ErrorKind::Cancelled));
    }
}
