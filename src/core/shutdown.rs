//! # Shutdown signal wiring.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes when the process
//! receives a termination signal, and the supervisor methods that connect any signal
//! source to [`Supervisor::begin_shutdown`].
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! Repeated deliveries are harmless: `begin_shutdown` is idempotent, and each watcher
//! exits as soon as shutdown has begun from any source.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::core::supervisor::Supervisor;

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

impl<O> Supervisor<O>
where
    O: Send + 'static,
{
    /// Calls [`begin_shutdown(deadline)`](Supervisor::begin_shutdown) once `signal` resolves.
    ///
    /// The watcher holds only a weak reference to the supervisor and stops early if
    /// shutdown begins from another source.
    pub fn shutdown_on<F>(self: &Arc<Self>, signal: F, deadline: Duration) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sup = Arc::downgrade(self);
        let started = self.runtime_token().clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = signal => {
                    if let Some(sup) = sup.upgrade() {
                        sup.begin_shutdown(deadline);
                    }
                }
                _ = started.cancelled() => {}
            }
        })
    }

    /// Wires OS termination signals to shutdown, using `cfg.grace` as drain deadline.
    ///
    /// If signal handlers cannot be registered the watcher never fires; the failure
    /// is logged when the `logging` feature is enabled.
    pub fn shutdown_on_os_signal(self: &Arc<Self>) -> JoinHandle<()> {
        let grace = self.config().grace;
        self.shutdown_on(
            async {
                if let Err(_err) = wait_for_shutdown_signal().await {
                    #[cfg(feature = "logging")]
                    tracing::error!(error = %_err, "failed to register shutdown signal handlers");
                    std::future::pending::<()>().await;
                }
            },
            grace,
        )
    }
}
