use chrono::{DateTime, Utc};
use gsa_core::alerts::AlertsResponse;
use gsa_core::auth::AuthStatus;
use gsa_core::hierarchy::HierarchyCache;
use gsa_core::rate_limit::RateLimits;
use gsa_core::refresh::DEFAULT_REFRESH_INTERVAL_MINUTES;
use gsa_core::selection::SelectionLedger;

/// Mutable per-session data, guarded by one async lock.
pub(super) struct SessionState {
    pub ledger: SelectionLedger,
    /// Set once the persisted selection has been read into `ledger`.
    pub selection_restored: bool,
    pub hierarchy: HierarchyCache,
    pub auth: AuthStatus,
    pub alerts: Option<AlertsResponse>,
    pub alerts_fetched_at: Option<DateTime<Utc>>,
    pub rate_limits: Option<RateLimits>,
    pub refresh_interval_minutes: u32,
    pub update_available: bool,
    /// Bumped on logout. Results of calls started under an older epoch are
    /// dropped.
    pub epoch: u64,
}

impl SessionState {
    pub fn new(ledger: SelectionLedger) -> Self {
        Self {
            ledger,
            selection_restored: false,
            hierarchy: HierarchyCache::new(),
            auth: AuthStatus::signed_out(),
            alerts: None,
            alerts_fetched_at: None,
            rate_limits: None,
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
            update_available: false,
            epoch: 0,
        }
    }

    /// Forgets everything tied to the signed-in account.
    pub fn reset_account(&mut self) {
        self.ledger.clear();
        self.selection_restored = false;
        self.hierarchy.clear();
        self.auth = AuthStatus::signed_out();
        self.alerts = None;
        self.alerts_fetched_at = None;
        self.rate_limits = None;
        self.epoch += 1;
    }
}
