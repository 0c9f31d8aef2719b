use super::{AppLifecycle, AppState, FeedFetcher};
use crate::config::{PollingConfig, DEFAULT_UNHEALTHY_INTERVAL, MAX_POLL_INTERVAL};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

type SharedFetcher = Arc<RwLock<Arc<dyn FeedFetcher>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Disabled or torn down
    Idle,
    /// Timer armed, app in the foreground
    Scheduled,
    /// Timer armed, app not in the foreground
    Suspended,
}

/// Owns a spawned task and aborts it when dropped.
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn spawn_guarded<F>(task: F) -> Option<TaskGuard>
where
    F: Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => Some(TaskGuard(handle.spawn(task))),
        Err(e) => {
            error!(error = %e, "No Tokio runtime, poller stays idle");
            None
        }
    }
}

/// Adaptive feed poller.
///
/// Feed each render/update cycle's inputs to [`AdaptivePoller::update`]. A
/// change of health flag or intervals tears the timer down and arms a new
/// one, so no tick of the old period survives the switch. Dropping the poller
/// cancels everything.
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use feed_engine::{AdaptivePoller, AppStateChannel, PollingConfig};
/// # async fn run() {
/// let lifecycle = Arc::new(AppStateChannel::default());
/// let mut poller = AdaptivePoller::new(
///     Arc::new(|| async { /* refetch posts */ }),
///     lifecycle.clone(),
///     PollingConfig::default().with_realtime_healthy(false),
/// );
///
/// // realtime channel came back
/// poller.update(PollingConfig::default().with_realtime_healthy(true));
/// # }
/// ```
pub struct AdaptivePoller {
    config: PollingConfig,
    fetcher: SharedFetcher,
    lifecycle: Arc<dyn AppLifecycle>,
    last_foreground_fetch: Arc<Mutex<Instant>>,
    timer: Option<TaskGuard>,
    listener: Option<TaskGuard>,
}

impl AdaptivePoller {
    /// Must be called from within a Tokio runtime; without one the poller stays idle.
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        lifecycle: Arc<dyn AppLifecycle>,
        config: PollingConfig,
    ) -> Self {
        let mut poller = Self {
            config: config.clone().with_enabled(false),
            fetcher: Arc::new(RwLock::new(fetcher)),
            lifecycle,
            last_foreground_fetch: Arc::new(Mutex::new(Instant::now())),
            timer: None,
            listener: None,
        };
        poller.update(config);
        poller
    }

    /// Applies a fresh input snapshot.
    pub fn update(&mut self, config: PollingConfig) {
        if config.exceeds_max_interval() {
            warn!(
                healthy_ms = config.healthy_interval.as_millis() as u64,
                unhealthy_ms = config.unhealthy_interval.as_millis() as u64,
                cap_ms = MAX_POLL_INTERVAL.as_millis() as u64,
                "Polling interval too large, capping"
            );
        }
        let next = config.normalized();
        let prev = std::mem::replace(&mut self.config, next.clone());

        if !next.enabled {
            if self.timer.is_some() || self.listener.is_some() {
                info!("Adaptive polling disabled");
            }
            self.teardown();
            return;
        }

        let period_changed = prev.realtime_healthy != next.realtime_healthy
            || prev.healthy_interval != next.healthy_interval
            || prev.unhealthy_interval != next.unhealthy_interval;

        if !prev.enabled || period_changed || self.timer.is_none() {
            self.arm_timer();
        }

        let grace_changed = prev.background_grace != next.background_grace;
        if !prev.enabled || grace_changed || self.listener.is_none() {
            self.attach_listener();
        }
    }

    /// Replaces the fetch callback. The next tick or resume uses it.
    pub fn set_fetcher(&self, fetcher: Arc<dyn FeedFetcher>) {
        *self.fetcher.write().unwrap_or_else(PoisonError::into_inner) = fetcher;
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    pub fn state(&self) -> PollerState {
        if self.timer.is_none() {
            PollerState::Idle
        } else if self.lifecycle.current().is_active() {
            PollerState::Scheduled
        } else {
            PollerState::Suspended
        }
    }

    /// Cancels the timer and detaches the lifecycle listener.
    pub fn shutdown(&mut self) {
        self.config.enabled = false;
        self.teardown();
    }

    fn teardown(&mut self) {
        self.timer = None;
        self.listener = None;
    }

    fn arm_timer(&mut self) {
        // cancel the old period before the new one exists
        self.timer = None;

        let period = self.config.active_interval();
        let now = Instant::now();
        let start = now.checked_add(period).unwrap_or_else(|| {
            warn!("Polling deadline out of range, using default interval");
            now + DEFAULT_UNHEALTHY_INTERVAL
        });
        let fetcher = Arc::clone(&self.fetcher);

        info!(
            period_ms = period.as_millis() as u64,
            realtime_healthy = self.config.realtime_healthy,
            "Adaptive polling armed"
        );

        self.timer = spawn_guarded(run_timer(start, period, fetcher));
    }

    fn attach_listener(&mut self) {
        self.listener = None;

        let rx = self.lifecycle.subscribe();
        let initial = self.lifecycle.current();
        let grace = self.config.background_grace;
        let last_fetch = Arc::clone(&self.last_foreground_fetch);
        let fetcher = Arc::clone(&self.fetcher);

        self.listener = spawn_guarded(run_listener(rx, initial, grace, last_fetch, fetcher));
    }
}

async fn run_timer(start: Instant, period: Duration, fetcher: SharedFetcher) {
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        debug!(period_ms = period.as_millis() as u64, "Polling tick");
        invoke(&fetcher);
    }
}

async fn run_listener(
    mut rx: broadcast::Receiver<AppState>,
    mut previous: AppState,
    grace: Duration,
    last_fetch: Arc<Mutex<Instant>>,
    fetcher: SharedFetcher,
) {
    loop {
        let state = match rx.recv().await {
            Ok(state) => state,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped = skipped, "App state events dropped");
                continue;
            }
            Err(RecvError::Closed) => {
                debug!("App lifecycle source closed");
                break;
            }
        };

        if !previous.is_active() && state.is_active() {
            let now = Instant::now();
            let due = {
                let mut last = last_fetch.lock().unwrap_or_else(PoisonError::into_inner);
                let elapsed = now.duration_since(*last);
                if elapsed > grace {
                    *last = now;
                    true
                } else {
                    false
                }
            };

            if due {
                info!("Foreground resume past grace period, refreshing feed");
                invoke(&fetcher);
            } else {
                debug!("Foreground resume within grace period");
            }
        }

        previous = state;
    }
}

/// Fires the latest callback without waiting for it.
fn invoke(fetcher: &SharedFetcher) {
    let current = Arc::clone(&*fetcher.read().unwrap_or_else(PoisonError::into_inner));
    tokio::spawn(async move {
        current.fetch().await;
    });
}
