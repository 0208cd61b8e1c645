//! Background supervisor cancelling requests that stayed pending too long.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info};

use crate::config::DispatchConfig;
use crate::core::{DispatchResult, Dispatcher};
use crate::infra::store::DispatchStore;
use crate::runtime::spawner::Spawn;

/// Shortest pause between sweeps.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically calls [`Dispatcher::cancel_stale_pending`].
pub struct StaleRequestSweeper<S: DispatchStore> {
    dispatcher: Arc<Dispatcher<S>>,
    interval: Duration,
    max_age: Duration,
}

/// Stops a running sweeper.
#[derive(Clone)]
pub struct SweeperHandle {
    shutdown: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl SweeperHandle {
    /// Ask the sweeper to stop after its current pass.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether [`SweeperHandle::stop`] was called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl<S: DispatchStore> StaleRequestSweeper<S> {
    /// Sweeper cancelling requests pending longer than `max_age`, checking
    /// every `interval`.
    #[must_use]
    pub const fn new(dispatcher: Arc<Dispatcher<S>>, interval: Duration, max_age: Duration) -> Self {
        Self {
            dispatcher,
            interval,
            max_age,
        }
    }

    /// Sweeper using `stale_pending_secs`, checking four times per window.
    #[must_use]
    pub fn from_config(dispatcher: Arc<Dispatcher<S>>, cfg: &DispatchConfig) -> Self {
        let max_age = Duration::from_secs(cfg.stale_pending_secs);
        Self::new(dispatcher, (max_age / 4).max(MIN_INTERVAL), max_age)
    }

    /// Pause between sweeps.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one pass now.
    pub async fn sweep_once(&self) -> DispatchResult<usize> {
        self.dispatcher.cancel_stale_pending(self.max_age).await
    }

    /// Start sweeping in the background.
    pub fn spawn<Sp: Spawn>(self, spawner: &Sp) -> SweeperHandle {
        let handle = SweeperHandle {
            shutdown: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        };
        let control = handle.clone();
        spawner.spawn(async move {
            info!(interval_ms = self.interval.as_millis(), max_age_secs = self.max_age.as_secs(), "stale request sweeper started");
            loop {
                tokio::select! {
                    () = tokio::time::sleep(self.interval) => {}
                    () = control.wake.notified() => {}
                }
                if control.is_stopped() {
                    break;
                }
                match self.sweep_once().await {
                    Ok(cancelled) => debug!(cancelled, "sweep finished"),
                    Err(err) => error!(%err, "sweep failed"),
                }
            }
            info!("stale request sweeper stopped");
        });
        handle
    }
}
