//! SessionController - one signed-in (or signed-out) session of the app.
//!
//! The controller owns the selection ledger, the owner hierarchy, the
//! refresh schedulers and the handshake coordinator. Nothing is global: two
//! controllers never share timers or selection state.
//!
//! # Locking
//!
//! Session data sits behind one `tokio::sync::Mutex`. It is never held across
//! a listing or alerts fetch; those calls snapshot what they need, release
//! the lock, and re-acquire it to apply the result. Persistence calls made by
//! the ledger and tray updates do run under the lock, which keeps saves and
//! badge counts in the same order as the state they mirror.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use gsa_core::alerts::AlertsResponse;
use gsa_core::auth::{AuthStatus, HandshakeCoordinator, HandshakeOutcome, HandshakePhase};
use gsa_core::error::{GsaError, Result};
use gsa_core::hierarchy::{ExpandOutcome, ExpandStep, OwnerNode};
use gsa_core::owner::Repository;
use gsa_core::rate_limit::{RATE_LIMIT_CHECK_INTERVAL_MINUTES, RateLimits};
use gsa_core::refresh::{
    DEFAULT_REFRESH_INTERVAL_MINUTES, RefreshScheduler, UPDATE_CHECK_INTERVAL_MINUTES,
    refresh_action,
};
use gsa_core::selection::{SelectionLedger, SelectionReconciler};
use tokio::sync::Mutex as AsyncMutex;

use super::collaborators::Collaborators;
use super::state::SessionState;
use crate::error_slot::{ErrorSlot, SurfacedError};

const EMPTY_TOKEN_MESSAGE: &str = "Please enter a GitHub token";
const FETCH_ERROR_KIND: &str = "transient_fetch";

pub struct SessionController {
    collab: Collaborators,
    state: AsyncMutex<SessionState>,
    alert_polling: Mutex<RefreshScheduler>,
    update_polling: Mutex<RefreshScheduler>,
    rate_limit_polling: Mutex<RefreshScheduler>,
    handshake: HandshakeCoordinator,
    errors: ErrorSlot,
    this: Weak<SessionController>,
}

impl SessionController {
    /// Builds a stopped, signed-out controller.
    ///
    /// Must be called from within a tokio runtime once timers start.
    pub fn create(collab: Collaborators) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let alerts_target = this.clone();
            let alert_polling = RefreshScheduler::new(
                "alerts",
                refresh_action(move || {
                    let target = alerts_target.clone();
                    async move {
                        if let Some(controller) = target.upgrade() {
                            // Failures are already surfaced by fetch_alerts.
                            let _ = controller.fetch_alerts().await;
                        }
                    }
                }),
            );

            let updates_target = this.clone();
            let update_polling = RefreshScheduler::new(
                "updates",
                refresh_action(move || {
                    let target = updates_target.clone();
                    async move {
                        if let Some(controller) = target.upgrade() {
                            controller.check_for_updates().await;
                        }
                    }
                }),
            );

            let rate_limits_target = this.clone();
            let rate_limit_polling = RefreshScheduler::new(
                "rate-limits",
                refresh_action(move || {
                    let target = rate_limits_target.clone();
                    async move {
                        if let Some(controller) = target.upgrade() {
                            let _ = controller.refresh_rate_limits().await;
                        }
                    }
                }),
            );

            let handshake = HandshakeCoordinator::with_deadline(
                collab.oauth.clone(),
                collab.opener.clone(),
                collab.handshake_deadline,
            );
            let ledger = SelectionLedger::new(collab.selection_store.clone());

            Self {
                state: AsyncMutex::new(SessionState::new(ledger)),
                alert_polling: Mutex::new(alert_polling),
                update_polling: Mutex::new(update_polling),
                rate_limit_polling: Mutex::new(rate_limit_polling),
                handshake,
                errors: ErrorSlot::new(),
                this: this.clone(),
                collab,
            }
        })
    }

    /// Stops every scheduler. Safe to call repeatedly.
    pub fn dispose(&self) {
        lock(&self.alert_polling).stop();
        lock(&self.update_polling).stop();
        lock(&self.rate_limit_polling).stop();
        tracing::info!("Session disposed");
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Reads the persisted interval, starts update polling and checks the
    /// stored token.
    pub async fn initialize(&self) -> Result<AuthStatus> {
        self.errors.clear();
        self.load_refresh_interval().await;
        self.start_update_polling();
        self.refresh_auth_status().await
    }

    /// Verifies the stored token. When accepted, restores the selection,
    /// fetches alerts once and starts alert polling.
    ///
    /// A rejected token signs the session out but leaves the selection
    /// ledger alone.
    pub async fn check_auth_status(&self) -> Result<AuthStatus> {
        self.errors.clear();
        self.refresh_auth_status().await
    }

    async fn refresh_auth_status(&self) -> Result<AuthStatus> {
        match self.collab.auth.get_auth_status().await {
            Ok(status) if status.authenticated => {
                tracing::info!("Signed in as {:?}", status.username);
                self.state.lock().await.auth = status.clone();
                self.restore_selection().await;
                let _ = self.fetch_alerts().await;
                self.start_alert_polling().await;
                self.start_rate_limit_polling();
                Ok(status)
            }
            Ok(status) => {
                tracing::info!("No valid token stored");
                self.state.lock().await.auth = status.clone();
                self.stop_account_polling();
                Ok(status)
            }
            Err(e) => {
                if e.is_auth() {
                    self.state.lock().await.auth = AuthStatus::signed_out();
                    self.stop_account_polling();
                }
                Err(self.surface("check auth status", e))
            }
        }
    }

    /// Signs in with a personal access token.
    pub async fn login_with_token(&self, token: &str) -> Result<AuthStatus> {
        let token = token.trim();
        if token.is_empty() {
            return Err(self.surface(
                "login",
                GsaError::InvalidInput(EMPTY_TOKEN_MESSAGE.to_string()),
            ));
        }
        if self.handshake.is_in_progress() {
            return Err(self.surface("login", GsaError::HandshakeInProgress));
        }

        self.errors.clear();
        if let Err(e) = self.collab.auth.set_token(token).await {
            return Err(self.surface("login", e));
        }
        self.complete_login().await
    }

    /// Signs in through the browser. The exchange is bounded by the
    /// handshake deadline; a timeout or rejection leaves the session signed
    /// out with the coordinator idle.
    pub async fn login_with_oauth(&self) -> Result<AuthStatus> {
        self.errors.clear();
        let token = match self.handshake.begin().await {
            Ok(token) => token,
            Err(e) => return Err(self.surface("authorization", e)),
        };
        if let Err(e) = self.collab.auth.set_token(&token).await {
            return Err(self.surface("login", e));
        }
        self.complete_login().await
    }

    async fn complete_login(&self) -> Result<AuthStatus> {
        let status = match self.collab.auth.get_auth_status().await {
            Ok(status) => status,
            Err(e) => return Err(self.surface("check auth status", e)),
        };
        self.state.lock().await.auth = status.clone();
        if !status.authenticated {
            return Err(self.surface("login", GsaError::auth("Token was not accepted")));
        }
        tracing::info!("Logged in as {:?}", status.username);

        // Listing failures are surfaced; the login itself stands.
        let _ = self.load_owners().await;
        let _ = self.fetch_alerts().await;
        self.start_alert_polling().await;
        self.start_rate_limit_polling();
        let update_polling = lock(&self.update_polling).is_running();
        if !update_polling {
            self.start_update_polling();
        }
        Ok(status)
    }

    /// Signs out. Timers stop before any state is cleared so that no tick
    /// can repopulate data mid-teardown.
    pub async fn logout(&self) -> Result<()> {
        self.stop_account_polling();
        lock(&self.update_polling).stop();

        let backend = self.collab.auth.logout().await;

        {
            let mut state = self.state.lock().await;
            state.reset_account();
            self.update_tray(0).await;
        }
        tracing::info!("Logged out");

        backend.map_err(|e| self.surface("logout", e))
    }

    // ============================================================================
    // Hierarchy and selection
    // ============================================================================

    /// Lists owners, restores the persisted selection, then expands the
    /// first owner.
    ///
    /// The selection is restored before any children are fetched, so the
    /// first loaded node already reflects it.
    pub async fn load_owners(&self) -> Result<Vec<OwnerNode>> {
        self.errors.clear();
        let owners = match self.collab.directory.get_owners().await {
            Ok(owners) => owners,
            Err(e) => return Err(self.surface("owners", e)),
        };

        let first = {
            let mut state = self.state.lock().await;
            state.hierarchy.initialize(owners);
            state.hierarchy.first_owner().map(str::to_string)
        };
        self.restore_selection().await;

        if let Some(first) = first {
            let _ = self.toggle_owner(&first).await;
        }
        Ok(self.owners().await)
    }

    /// Expands or collapses an owner, fetching its repositories on first
    /// expansion.
    ///
    /// Children fetched for a session that has since ended are dropped with
    /// `NotFound`, leaving the current session's node untouched.
    pub async fn toggle_owner(&self, owner: &str) -> Result<ExpandOutcome> {
        let (step, epoch) = {
            let mut state = self.state.lock().await;
            (state.hierarchy.begin_expand(owner), state.epoch)
        };
        let target = match step {
            Ok(ExpandStep::Collapsed) => return Ok(ExpandOutcome::Collapsed),
            Ok(ExpandStep::AlreadyLoading) => return Ok(ExpandOutcome::AlreadyLoading),
            Ok(ExpandStep::Expanded) => return Ok(ExpandOutcome::Expanded),
            Ok(ExpandStep::Fetch(target)) => target,
            Err(e) => return Err(self.surface("expand owner", e)),
        };

        let fetched = self
            .collab
            .directory
            .get_repos_for_owner(&target.name, target.is_user)
            .await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            tracing::debug!(owner, "Dropping repositories fetched for an ended session");
            return Err(GsaError::not_found("loading owner", owner));
        }
        let SessionState {
            hierarchy, ledger, ..
        } = &mut *state;
        match hierarchy.complete_expand(owner, fetched, ledger) {
            Ok(outcome) => Ok(outcome),
            // The hierarchy was rebuilt or cleared while fetching.
            Err(e @ GsaError::NotFound { .. }) => Err(e),
            Err(e) => Err(self.surface("expand owner", e)),
        }
    }

    /// Flips one loaded repository. Returns its new selection state.
    pub async fn toggle_repo(&self, owner: &str, full_name: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let SessionState {
            hierarchy, ledger, ..
        } = &mut *state;
        let result = match hierarchy.node_mut(owner) {
            Some(node) => SelectionReconciler::toggle(node, full_name, ledger).await,
            None => Err(GsaError::not_found("owner", owner)),
        };
        result.map_err(|e| self.surface("toggle repository", e))
    }

    pub async fn select_all_for_owner(&self, owner: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let SessionState {
            hierarchy, ledger, ..
        } = &mut *state;
        let result = match hierarchy.node_mut(owner) {
            Some(node) => SelectionReconciler::select_all_for_owner(node, ledger).await,
            None => Err(GsaError::not_found("owner", owner)),
        };
        result.map_err(|e| self.surface("select all", e))
    }

    pub async fn select_none_for_owner(&self, owner: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let SessionState {
            hierarchy, ledger, ..
        } = &mut *state;
        let result = match hierarchy.node_mut(owner) {
            Some(node) => SelectionReconciler::select_none_for_owner(node, ledger).await,
            None => Err(GsaError::not_found("owner", owner)),
        };
        result.map_err(|e| self.surface("select none", e))
    }

    /// Loaded repositories of `owner` matching `query`. Display only.
    pub async fn filtered_repos(&self, owner: &str, query: &str) -> Result<Vec<Repository>> {
        let state = self.state.lock().await;
        let node = state
            .hierarchy
            .node(owner)
            .ok_or_else(|| GsaError::not_found("owner", owner))?;
        Ok(SelectionReconciler::filter(node, query)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn owners(&self) -> Vec<OwnerNode> {
        self.state.lock().await.hierarchy.nodes().to_vec()
    }

    pub async fn selected_count(&self) -> usize {
        self.state.lock().await.ledger.count()
    }

    /// Counted from the ledger, so owners never expanded are included.
    pub async fn selected_count_for_owner(&self, owner: &str) -> usize {
        self.state.lock().await.ledger.count_for_owner(owner)
    }

    pub async fn total_repos_count(&self) -> usize {
        self.state.lock().await.hierarchy.total_repos_count()
    }

    // ============================================================================
    // Refresh
    // ============================================================================

    /// Persists a new polling interval and restarts alert polling with it.
    ///
    /// The in-memory interval changes even when saving fails.
    pub async fn set_refresh_interval(&self, minutes: u32) -> Result<()> {
        self.errors.clear();
        let authenticated = {
            let mut state = self.state.lock().await;
            state.refresh_interval_minutes = minutes;
            state.auth.authenticated
        };
        if authenticated {
            lock(&self.alert_polling).start(minutes);
        }

        self.collab
            .interval_store
            .set_refresh_interval(minutes)
            .await
            .map_err(|e| match e {
                GsaError::Persistence(_) => e,
                other => GsaError::persistence(other.to_string()),
            })
            .map_err(|e| self.surface("save refresh interval", e))
    }

    /// Fetches alerts for the current selection.
    ///
    /// Returns `Ok(None)` when signed out or when the session changed while
    /// the request was in flight. The latest response to arrive replaces the
    /// stored one, and the tray always shows the stored total.
    ///
    /// A new attempt clears a fetch error left by the previous one; other
    /// kinds of error stay in the slot.
    pub async fn fetch_alerts(&self) -> Result<Option<AlertsResponse>> {
        let (selection, epoch) = {
            let state = self.state.lock().await;
            if !state.auth.authenticated {
                tracing::debug!("Skipping alert fetch while signed out");
                return Ok(None);
            }
            (state.ledger.snapshot(), state.epoch)
        };
        self.errors.clear_kind(FETCH_ERROR_KIND);

        let response = match self.collab.alerts.get_security_alerts(&selection).await {
            Ok(response) => response,
            Err(e) => return Err(self.surface("alerts", e)),
        };

        let mut state = self.state.lock().await;
        if state.epoch != epoch || !state.auth.authenticated {
            tracing::debug!("Dropping alerts fetched for an ended session");
            return Ok(None);
        }
        state.alerts = Some(response.clone());
        state.alerts_fetched_at = Some(Utc::now());
        self.update_tray(response.total_alerts).await;
        Ok(Some(response))
    }

    /// Reads the GitHub rate limits of the signed-in token.
    ///
    /// Failures are logged and keep the last known limits; they never reach
    /// the error slot.
    pub async fn refresh_rate_limits(&self) -> Result<Option<RateLimits>> {
        let epoch = {
            let state = self.state.lock().await;
            if !state.auth.authenticated {
                return Ok(None);
            }
            state.epoch
        };

        let limits = match self.collab.rate_limits.get_rate_limits().await {
            Ok(limits) => limits,
            Err(e) => {
                tracing::warn!("Failed to read rate limits: {}", e);
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        if state.epoch != epoch || !state.auth.authenticated {
            return Ok(None);
        }
        state.rate_limits = limits.clone();
        Ok(limits)
    }

    /// Update-poll action. Failures are logged and otherwise ignored.
    pub async fn check_for_updates(&self) -> bool {
        match self.collab.updates.check_for_updates().await {
            Ok(available) => {
                tracing::debug!("Update available: {}", available);
                self.state.lock().await.update_available = available;
                available
            }
            Err(e) => {
                tracing::warn!("Update check failed: {}", e);
                false
            }
        }
    }

    /// Opens `url` externally. Failure is reported in the error slot only.
    pub async fn open_external_link(&self, url: &str) {
        if let Err(e) = self.collab.opener.open(url).await {
            tracing::warn!("Failed to open {}: {}", url, e);
            self.errors
                .set_message(e.kind(), format!("Could not open {}: {}", url, e));
        }
    }

    // ============================================================================
    // Observers
    // ============================================================================

    pub fn current_error(&self) -> Option<SurfacedError> {
        self.errors.current()
    }

    pub async fn alerts(&self) -> Option<AlertsResponse> {
        self.state.lock().await.alerts.clone()
    }

    pub async fn alerts_fetched_at(&self) -> Option<chrono::DateTime<Utc>> {
        self.state.lock().await.alerts_fetched_at
    }

    pub async fn rate_limits(&self) -> Option<RateLimits> {
        self.state.lock().await.rate_limits.clone()
    }

    pub async fn auth_state(&self) -> AuthStatus {
        self.state.lock().await.auth.clone()
    }

    pub fn handshake_phase(&self) -> HandshakePhase {
        self.handshake.phase()
    }

    pub fn last_handshake_outcome(&self) -> Option<HandshakeOutcome> {
        self.handshake.last_outcome()
    }

    pub async fn refresh_interval_minutes(&self) -> u32 {
        self.state.lock().await.refresh_interval_minutes
    }

    pub async fn update_available(&self) -> bool {
        self.state.lock().await.update_available
    }

    /// Interval of the live alert timer; `0` when polling is stopped.
    pub fn alert_polling_interval(&self) -> u32 {
        lock(&self.alert_polling).interval_minutes()
    }

    pub fn is_update_polling(&self) -> bool {
        lock(&self.update_polling).is_running()
    }

    pub fn is_rate_limit_polling(&self) -> bool {
        lock(&self.rate_limit_polling).is_running()
    }

    // ============================================================================
    // Internals
    // ============================================================================

    async fn load_refresh_interval(&self) {
        let minutes = match self.collab.interval_store.get_refresh_interval().await {
            Ok(minutes) => minutes,
            Err(e) => {
                tracing::warn!(
                    "Unusable refresh interval, using {} minutes: {}",
                    DEFAULT_REFRESH_INTERVAL_MINUTES,
                    e
                );
                self.errors.set(&e);
                DEFAULT_REFRESH_INTERVAL_MINUTES
            }
        };
        self.state.lock().await.refresh_interval_minutes = minutes;
    }

    /// Reads the persisted selection into the ledger once per session.
    async fn restore_selection(&self) {
        let mut state = self.state.lock().await;
        if state.selection_restored {
            return;
        }
        let loaded = state.ledger.load().await;
        match loaded {
            Ok(count) => {
                tracing::debug!("Restored {} selected repositories", count);
                state.selection_restored = true;
            }
            Err(e) => {
                drop(state);
                self.surface("restore selection", e);
            }
        }
    }

    async fn start_alert_polling(&self) {
        let minutes = self.state.lock().await.refresh_interval_minutes;
        lock(&self.alert_polling).start(minutes);
    }

    /// Starts rate-limit polling plus one immediate read.
    fn start_rate_limit_polling(&self) {
        lock(&self.rate_limit_polling).start(RATE_LIMIT_CHECK_INTERVAL_MINUTES);
        if let Some(controller) = self.this.upgrade() {
            tokio::spawn(async move {
                let _ = controller.refresh_rate_limits().await;
            });
        }
    }

    /// Stops the timers that only make sense while signed in.
    fn stop_account_polling(&self) {
        lock(&self.alert_polling).stop();
        lock(&self.rate_limit_polling).stop();
    }

    /// Starts hourly update polling plus one immediate check.
    fn start_update_polling(&self) {
        lock(&self.update_polling).start(UPDATE_CHECK_INTERVAL_MINUTES);
        if let Some(controller) = self.this.upgrade() {
            tokio::spawn(async move {
                controller.check_for_updates().await;
            });
        }
    }

    async fn update_tray(&self, count: usize) {
        if let Err(e) = self.collab.tray.update_tray_icon(count).await {
            tracing::warn!("Failed to update tray icon: {}", e);
        }
    }

    /// Logs `error`, puts it in the error slot and hands it back.
    fn surface(&self, operation: &str, error: GsaError) -> GsaError {
        tracing::error!("{} failed: {}", operation, error);
        self.errors.set(&error);
        error
    }
}

fn lock(scheduler: &Mutex<RefreshScheduler>) -> MutexGuard<'_, RefreshScheduler> {
    scheduler.lock().unwrap_or_else(PoisonError::into_inner)
}
