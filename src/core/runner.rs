//! # Run a single dispatched unit.
//!
//! Executes one [`WorkUnit`](crate::WorkUnit) with optional concurrency slot and timeout,
//! converts panics into [`ErrorKind::Internal`], and publishes lifecycle events to [`Bus`].
//!
//! ## Event flow
//!
//! ```text
//! Cancelled before start:
//!   (slot wait | pre-start check) → publish UnitCancelled
//!
//! Success:
//!   publish UnitStarting → unit.spawn() → Ok(o) → publish UnitCompleted
//!
//! Cancellation observed by the unit:
//!   ... → Err(Cancelled) → publish UnitCancelled
//!
//! Failure:
//!   ... → Err(e) → publish UnitFailed
//!
//! Panic:
//!   ... → catch_unwind → publish UnitPanicked → publish UnitFailed
//!
//! Timeout:
//!   deadline hit → cancel child token → publish UnitTimedOut
//!                → wait for the unit to return → publish UnitFailed (timeout)
//! ```
//!
//! ## Rules
//! - Publishes **exactly one** terminal event: `UnitCompleted`, `UnitCancelled` or `UnitFailed`
//! - A unit is never invoked once its token is cancelled
//! - Timeouts are cooperative: the unit is asked to stop, never dropped mid-flight

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::{sync::Semaphore, time, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::core::ledger::Bucket;
use crate::core::report::TicketId;
use crate::error::ErrorKind;
use crate::events::{Bus, Event, EventKind};
use crate::state::SharedState;
use crate::units::UnitRef;

/// Everything needed to run one accepted unit.
pub(crate) struct Dispatch<O> {
    pub(crate) ticket: TicketId,
    pub(crate) name: Arc<str>,
    pub(crate) unit: UnitRef<O>,
    pub(crate) state: SharedState,
    pub(crate) ctx: CancellationToken,
    pub(crate) timeout: Option<Duration>,
    pub(crate) semaphore: Option<Arc<Semaphore>>,
}

/// Runs `d` to its terminal result, publishing lifecycle events to `bus`.
pub(crate) async fn run_unit<O>(d: Dispatch<O>, bus: &Bus) -> Result<O, ErrorKind>
where
    O: Send + 'static,
{
    let _permit = match &d.semaphore {
        Some(sem) => {
            let permit = tokio::select! {
                biased;
                _ = d.ctx.cancelled() => None,
                res = Arc::clone(sem).acquire_owned() => res.ok(),
            };
            match permit {
                Some(p) => Some(p),
                None => {
                    publish_terminal(bus, &d, Bucket::Cancelled, Duration::ZERO, None);
                    return Err(ErrorKind::Cancelled);
                }
            }
        }
        None => None,
    };

    if d.ctx.is_cancelled() {
        publish_terminal(bus, &d, Bucket::Cancelled, Duration::ZERO, None);
        return Err(ErrorKind::Cancelled);
    }

    bus.publish(
        Event::new(EventKind::UnitStarting)
            .with_ticket(d.ticket.get())
            .with_unit(Arc::clone(&d.name)),
    );

    let started = Instant::now();
    let child = d.ctx.child_token();
    let work = AssertUnwindSafe(async {
        d.unit
            .spawn(Arc::clone(&d.state), child.clone())
            .await
    })
    .catch_unwind();
    let mut work = pin!(work);

    // `timed_out` is set when the unit's wind-down ran after its timeout fired.
    let (caught, timed_out) = match d.timeout.filter(|t| *t > Duration::ZERO) {
        Some(limit) => {
            tokio::select! {
                res = &mut work => (res, None),
                _ = time::sleep(limit) => {
                    child.cancel();
                    bus.publish(
                        Event::new(EventKind::UnitTimedOut)
                            .with_ticket(d.ticket.get())
                            .with_unit(Arc::clone(&d.name))
                            .with_elapsed(limit),
                    );
                    let wind_down = work.await;
                    let timeout = ErrorKind::Timeout { elapsed: started.elapsed() };
                    match wind_down {
                        Ok(_) => (Ok(Err(timeout)), None),
                        Err(payload) => (Err(payload), Some(timeout)),
                    }
                }
            }
        }
        None => (work.await, None),
    };

    let res = match caught {
        Ok(res) => res,
        Err(payload) => {
            let info = panic_message(&*payload);
            bus.publish(
                Event::new(EventKind::UnitPanicked)
                    .with_ticket(d.ticket.get())
                    .with_unit(Arc::clone(&d.name))
                    .with_reason(info.clone()),
            );
            let message = format!("panicked: {info}");
            match timed_out {
                Some(timeout) => Err(ErrorKind::internal_caused_by(d.name.as_ref(), message, timeout)),
                None => Err(ErrorKind::internal(d.name.as_ref(), message)),
            }
        }
    };

    let reason = res.as_ref().err().map(ToString::to_string);
    publish_terminal(bus, &d, Bucket::of(&res), started.elapsed(), reason);
    res
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn publish_terminal<O>(
    bus: &Bus,
    d: &Dispatch<O>,
    bucket: Bucket,
    elapsed: Duration,
    reason: Option<String>,
) {
    let kind = match bucket {
        Bucket::Completed => EventKind::UnitCompleted,
        Bucket::Failed => EventKind::UnitFailed,
        Bucket::Cancelled => EventKind::UnitCancelled,
    };
    let mut ev = Event::new(kind)
        .with_ticket(d.ticket.get())
        .with_unit(Arc::clone(&d.name))
        .with_elapsed(elapsed);
    if let Some(reason) = reason {
        ev = ev.with_reason(reason);
    }
    bus.publish(ev);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ServiceState;
    use crate::units::{UnitFn, WorkUnit, until_cancelled};

    fn dispatch<O: Send + 'static>(unit: UnitRef<O>, ctx: CancellationToken, timeout: Option<Duration>) -> Dispatch<O> {
        Dispatch {
            ticket: TicketId(1),
            name: Arc::from(unit.name()),
            unit,
            state: Arc::new(ServiceState::builder().build().unwrap()),
            ctx,
            timeout,
            semaphore: None,
        }
    }

    fn explode() -> Result<u8, ErrorKind> {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn panic_becomes_internal() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let unit: UnitRef<u8> = UnitFn::arc("boom", |_s: SharedState, _c: CancellationToken| async move {
            explode()
        });

        let res = run_unit(dispatch(unit, CancellationToken::new(), None), &bus).await;
        match res {
            Err(ErrorKind::Internal { role, message, .. }) => {
                assert_eq!(role, "boom");
                assert!(message.contains("kaboom"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::UnitStarting, EventKind::UnitPanicked, EventKind::UnitFailed]
        );
    }

    #[tokio::test]
    async fn already_cancelled_unit_is_not_invoked() {
        let bus = Bus::new(16);
        let invoked = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&invoked);
        let unit: UnitRef<()> = UnitFn::arc("never", move |_s: SharedState, _c: CancellationToken| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            async { Ok::<(), ErrorKind>(()) }
        });

        let ctx = CancellationToken::new();
        ctx.cancel();
        let res = run_unit(dispatch(unit, ctx, None), &bus).await;
        assert_eq!(res, Err(ErrorKind::Cancelled));
        assert!(!invoked.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn timeout_cancels_cooperatively() {
        let bus = Bus::new(16);
        let unit: UnitRef<()> = UnitFn::arc("slow", |_s: SharedState, ctx: CancellationToken| async move {
            until_cancelled(&ctx, tokio::time::sleep(Duration::from_secs(30))).await?;
            Ok::<(), ErrorKind>(())
        });

        let res = run_unit(
            dispatch(unit, CancellationToken::new(), Some(Duration::from_millis(20))),
            &bus,
        )
        .await;
        match res {
            Err(ErrorKind::Timeout { elapsed }) => assert!(elapsed >= Duration::from_millis(20)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    fn explode_on_cleanup() -> Result<(), ErrorKind> {
        panic!("cleanup failed")
    }

    #[tokio::test]
    async fn panic_during_timeout_wind_down_is_internal() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let unit: UnitRef<()> = UnitFn::arc("messy", |_s: SharedState, ctx: CancellationToken| async move {
            ctx.cancelled().await;
            explode_on_cleanup()
        });

        let res = run_unit(
            dispatch(unit, CancellationToken::new(), Some(Duration::from_millis(10))),
            &bus,
        )
        .await;
        match res {
            Err(err @ ErrorKind::Internal { .. }) => {
                assert!(err.as_message().contains("cleanup failed"));
                assert!(matches!(err.cause(), Some(ErrorKind::Timeout { .. })));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let kinds: Vec<EventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::UnitStarting,
                EventKind::UnitTimedOut,
                EventKind::UnitPanicked,
                EventKind::UnitFailed
            ]
        );
    }
}
