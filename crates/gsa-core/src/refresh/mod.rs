//! Periodic refresh: one restartable repeating timer per logical task, and
//! the persisted interval setting that drives alert polling.

mod interval;
mod scheduler;

pub use interval::{
    DEFAULT_REFRESH_INTERVAL_MINUTES, REFRESH_INTERVAL_CHOICES, RefreshIntervalStore,
    UPDATE_CHECK_INTERVAL_MINUTES, parse_refresh_interval,
};
pub use scheduler::{RefreshAction, RefreshScheduler, TimerHandle, TimerId, refresh_action};
