//! Cancellable polling loop driving state synchronization.
//!
//! One [`Poller`] task per session periodically calls
//! [`WorkflowSession::poll_once`](crate::session::WorkflowSession::poll_once)
//! for the currently viewed path/runtime. The cadence is short while the
//! selected run is live and long otherwise, bounding server load without
//! starving feedback. While the user is flagged inactive the loop parks
//! entirely and a [`ActivityTracker::touch`] wakes it for an immediate poll.
//!
//! Poll failures are logged and retried on the next tick rather than
//! surfaced per-tick; stopping or dropping the [`PollerHandle`] ends the
//! task deterministically.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use crate::session::WorkflowSession;

fn env_duration_ms(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// Poll cadence and inactivity gating, overridable from the environment.
#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Tick period while the selected run is `Running`.
    pub active_interval: Duration,
    /// Tick period while no run is live.
    pub idle_interval: Duration,
    /// User-inactivity window after which polling is suppressed.
    pub inactivity_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        dotenvy::dotenv().ok();
        Self {
            active_interval: env_duration_ms("FLOWSYNC_ACTIVE_POLL_MS", 700),
            idle_interval: env_duration_ms("FLOWSYNC_IDLE_POLL_MS", 5_000),
            inactivity_timeout: env_duration_ms("FLOWSYNC_INACTIVITY_TIMEOUT_MS", 180_000),
        }
    }
}

/// Tracks the instant of the last user interaction.
///
/// Cloneable handle shared between the UI host (which calls
/// [`touch`](Self::touch) on input) and the poller (which parks while
/// [`is_inactive`](Self::is_inactive) holds).
#[derive(Clone, Debug)]
pub struct ActivityTracker {
    last: Arc<Mutex<Instant>>,
    wake: Arc<Notify>,
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityTracker {
    #[must_use]
    pub fn new() -> Self {
        ActivityTracker {
            last: Arc::new(Mutex::new(Instant::now())),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Record a user interaction and wake a parked poller immediately.
    pub fn touch(&self) {
        if let Ok(mut last) = self.last.lock() {
            *last = Instant::now();
        }
        self.wake.notify_waiters();
    }

    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last
            .lock()
            .map(|last| last.elapsed())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_inactive(&self, timeout: Duration) -> bool {
        self.idle_for() >= timeout
    }

    async fn woken(&self) {
        self.wake.notified().await;
    }
}

/// Handle controlling a spawned poller task.
///
/// Dropping the handle closes the cancellation channel, which also stops
/// the task.
#[derive(Debug)]
pub struct PollerHandle {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PollerHandle {
    /// Request the task to stop at its next wait point.
    pub fn stop(&self) {
        let _ = self.cancel.send(true);
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.stop();
        let _ = self.handle.await;
    }
}

/// Spawns and owns nothing itself; see [`Poller::spawn`].
pub struct Poller;

impl Poller {
    /// Spawn the synchronization loop for `session`.
    pub fn spawn(
        session: Arc<tokio::sync::Mutex<WorkflowSession>>,
        config: PollerConfig,
    ) -> PollerHandle {
        let (cancel, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let activity = { session.lock().await.activity().clone() };
            loop {
                if *rx.borrow() {
                    break;
                }
                if activity.is_inactive(config.inactivity_timeout) {
                    // Parked: only a user interaction or cancellation wakes us.
                    tokio::select! {
                        changed = rx.changed() => {
                            if changed.is_err() || *rx.borrow() {
                                break;
                            }
                            continue;
                        }
                        _ = activity.woken() => {}
                    }
                } else {
                    let interval = { session.lock().await.poll_interval(&config) };
                    tokio::select! {
                        changed = rx.changed() => {
                            if changed.is_err() || *rx.borrow() {
                                break;
                            }
                            continue;
                        }
                        _ = sleep(interval) => {}
                    }
                    if activity.is_inactive(config.inactivity_timeout) {
                        continue;
                    }
                }
                let mut guard = session.lock().await;
                if let Err(err) = guard.poll_once().await {
                    debug!(error = %err, "poll failed; retrying on next tick");
                }
            }
        });
        PollerHandle { cancel, handle }
    }
}
