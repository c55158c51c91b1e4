//! # Example: host
//!
//! A small service host wired end to end.
//!
//! Shows how to:
//! - Bind collaborators into a [`ServiceState`] and start them
//! - Submit work units that use those collaborators
//! - Wire OS signals (and a fallback timer) to graceful shutdown
//! - Drain, stop collaborators and exit with the drain report's exit code
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► ServiceState { storage, notifier } ─► start_all()
//!   ├─► Supervisor::builder(cfg, state).with_subscriber(LogWriter).build()
//!   ├─► submit: 3 × "ingest", 1 × "digest" (runs until cancelled), 1 × "stubborn"
//!   ├─► shutdown_on_os_signal()          (Ctrl-C / SIGTERM)
//!   ├─► shutdown_on(sleep(3s), 1s)       (so the demo ends on its own)
//!   │
//!   ├─► wait_for_drain()
//!   │     ├─ ingest/digest finish or observe cancellation
//!   │     └─ stubborn ignores cancellation ─► abandoned, undrained = 1
//!   │
//!   └─► stop_all() ─► shutdown_subscribers() ─► exit(report.exit_code())
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example host
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use servicecore::{
    Collaborator, ErrorKind, LogWriter, ServiceState, SharedState, Supervisor, SupervisorConfig,
    UnitFn, until_cancelled,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// In-memory counter store.
#[derive(Default)]
struct Storage {
    rows: AtomicU64,
}

impl Storage {
    fn insert(&self, n: u64) -> u64 {
        self.rows.fetch_add(n, Ordering::SeqCst) + n
    }
}

#[async_trait]
impl Collaborator for Storage {
    async fn start(&self) -> Result<(), ErrorKind> {
        tracing::info!("storage: open");
        Ok(())
    }

    async fn stop(&self) -> Result<(), ErrorKind> {
        tracing::info!(rows = self.rows.load(Ordering::SeqCst), "storage: closed");
        Ok(())
    }
}

/// Prints notifications.
struct Notifier;

impl Notifier {
    fn notify(&self, msg: &str) {
        println!("[notifier] {msg}");
    }
}

impl Collaborator for Notifier {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1. Collaborators
    let state = ServiceState::builder()
        .require("storage")
        .require("notifier")
        .bind("storage", Arc::new(Storage::default()))
        .bind("notifier", Arc::new(Notifier))
        .build()?;
    state.start_all().await?;

    // 2. Supervisor
    let cfg = SupervisorConfig {
        grace: Duration::from_secs(5),
        max_concurrent: 4,
        ..SupervisorConfig::default()
    };
    let sup = Supervisor::<u64>::builder(cfg, state)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build()?;

    // 3. Units
    let mut tickets = Vec::new();
    for batch in 1..=3u64 {
        let ingest = UnitFn::new("ingest", move |state: SharedState, ctx: CancellationToken| async move {
            let storage = state.handle::<Storage>("storage")?;
            until_cancelled(&ctx, tokio::time::sleep(Duration::from_millis(200 * batch))).await?;
            Ok::<u64, ErrorKind>(storage.insert(batch * 10))
        });
        tickets.push(sup.submit(ingest)?);
    }

    let digest = UnitFn::new("digest", |state: SharedState, ctx: CancellationToken| async move {
        let notifier = state.handle::<Notifier>("notifier")?;
        let mut sent = 0u64;
        while until_cancelled(&ctx, tokio::time::sleep(Duration::from_millis(700)))
            .await
            .is_ok()
        {
            sent += 1;
            notifier.notify(&format!("digest #{sent}"));
        }
        notifier.notify("digest stopped");
        Ok::<u64, ErrorKind>(sent)
    });
    tickets.push(sup.submit(digest)?);

    // Ignores its token on purpose, to show an abandoned unit.
    let stubborn = UnitFn::new("stubborn", |_state: SharedState, _ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok::<u64, ErrorKind>(0)
    });
    sup.submit_detached(stubborn)?;

    // 4. Shutdown wiring
    sup.shutdown_on_os_signal();
    sup.shutdown_on(tokio::time::sleep(Duration::from_secs(3)), Duration::from_secs(1));

    for ticket in tickets {
        match sup.await_outcome(ticket).await {
            Ok(rows) => println!("{ticket}: ok ({rows})"),
            Err(err) => println!("{ticket}: {} ({})", err.as_label(), err.as_message()),
        }
    }

    // 5. Drain and stop
    let report = sup.wait_for_drain().await?;
    println!(
        "drain: completed={} failed={} cancelled={} undrained={}",
        report.completed, report.failed, report.cancelled, report.undrained
    );
    sup.state().stop_all().await?;
    sup.shutdown_subscribers().await;

    std::process::exit(report.exit_code());
}
