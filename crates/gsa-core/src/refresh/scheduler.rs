//! Restartable repeating timer.
//!
//! Each logical task (alert polling, update polling) owns its own
//! [`RefreshScheduler`]. Starting a running scheduler cancels the old timer
//! before creating the new one, so at most one timer per scheduler is ever
//! live. Firings are measured from the moment `start` is called.
//!
//! Every firing spawns the action as its own task. Stopping therefore only
//! cancels future firings: an action already running completes, and two
//! firings of a slow action may overlap.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Action fired on every tick.
pub type RefreshAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async closure as a [`RefreshAction`].
pub fn refresh_action<F, Fut>(f: F) -> RefreshAction
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move || -> BoxFuture<'static, ()> { Box::pin(f()) })
}

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a timer. Only compared, never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Opaque handle to one live repeating timer.
pub struct TimerHandle {
    id: TimerId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Starts a timer firing `action` every `period`, first after one period.
    ///
    /// Must be called from within a tokio runtime.
    fn spawn(name: &'static str, period: Duration, action: RefreshAction) -> Self {
        let id = TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed));
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        tracing::debug!(target: "refresh", task = name, "tick");
                        tokio::spawn(action());
                    }
                }
            }
            tracing::debug!(target: "refresh", task = name, "timer loop exited");
        });

        Self { id, cancel, task }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    fn cancel(self) {
        self.cancel.cancel();
        // The loop exits on its own; dropping the JoinHandle detaches it.
        drop(self.task);
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle").field("id", &self.id).finish()
    }
}

/// One logical periodic task: Stopped ⇄ Running.
pub struct RefreshScheduler {
    name: &'static str,
    action: RefreshAction,
    interval_minutes: u32,
    timer: Option<TimerHandle>,
}

impl RefreshScheduler {
    pub fn new(name: &'static str, action: RefreshAction) -> Self {
        Self {
            name,
            action,
            interval_minutes: 0,
            timer: None,
        }
    }

    /// (Re)starts the timer with a new interval in minutes.
    ///
    /// Any running timer is cancelled first. `0` disables the task and is
    /// equivalent to [`stop`](Self::stop).
    pub fn start(&mut self, interval_minutes: u32) {
        self.stop();
        if interval_minutes == 0 {
            tracing::info!(target: "refresh", task = self.name, "disabled (interval 0)");
            return;
        }

        let period = Duration::from_secs(u64::from(interval_minutes) * 60);
        let handle = TimerHandle::spawn(self.name, period, Arc::clone(&self.action));
        tracing::info!(
            target: "refresh",
            task = self.name,
            interval_minutes,
            timer = ?handle.id(),
            "started"
        );
        self.interval_minutes = interval_minutes;
        self.timer = Some(handle);
    }

    /// Cancels future firings. Safe in any state, including never started.
    pub fn stop(&mut self) {
        if let Some(handle) = self.timer.take() {
            tracing::info!(target: "refresh", task = self.name, timer = ?handle.id(), "stopped");
            handle.cancel();
        }
        self.interval_minutes = 0;
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Interval of the live timer; `0` when stopped.
    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    pub fn timer_id(&self) -> Option<TimerId> {
        self.timer.as_ref().map(TimerHandle::id)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("name", &self.name)
            .field("interval_minutes", &self.interval_minutes)
            .field("timer", &self.timer)
            .finish()
    }
}
