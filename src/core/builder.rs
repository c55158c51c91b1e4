use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{config::SupervisorConfig, supervisor::Supervisor};
use crate::{
    error::ErrorKind,
    events::Bus,
    state::SharedState,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder<O> {
    cfg: SupervisorConfig,
    state: SharedState,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _outcome: PhantomData<fn() -> O>,
}

impl<O> SupervisorBuilder<O>
where
    O: Send + 'static,
{
    /// Creates a new builder with the given configuration and service state.
    pub fn new(cfg: SupervisorConfig, state: SharedState) -> Self {
        Self {
            cfg,
            state,
            subscribers: Vec::new(),
            _outcome: PhantomData,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (submissions, outcomes, shutdown, drain)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds a single subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the supervisor in phase `Running`.
    ///
    /// Initializes the event bus, subscriber workers and the listener that fans
    /// events out to them. Must be called from within a Tokio runtime; otherwise
    /// fails with `Internal`.
    pub fn build(self) -> Result<Arc<Supervisor<O>>, ErrorKind> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ErrorKind::wrap("supervisor", e))?;
        let _guard = runtime.enter();

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let listener_token = CancellationToken::new();

        let listener = spawn_listener(&bus, Arc::clone(&subs), listener_token.clone());

        Ok(Arc::new(Supervisor::new_internal(
            self.cfg,
            self.state,
            runtime.clone(),
            bus,
            subs,
            listener_token,
            listener,
        )))
    }
}

/// Forwards bus events to the subscriber set until `stop` is cancelled.
///
/// On stop, events already queued on the bus are still delivered.
fn spawn_listener(bus: &Bus, set: Arc<SubscriberSet>, stop: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    while let Ok(ev) = rx.try_recv() {
                        set.emit(&ev);
                    }
                    break;
                }
            }
        }
    })
}
