//! In-memory collaborators for controller tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gsa_application::{Collaborators, SessionController};
use gsa_core::alerts::{AlertsResponse, AlertsSource, RepoAlerts, TrayNotifier};
use gsa_core::auth::{AuthService, AuthStatus, LinkOpener, OAuthBackend};
use gsa_core::error::{GsaError, Result};
use gsa_core::owner::{Owner, OwnerDirectory, Repository};
use gsa_core::rate_limit::{RateLimit, RateLimitSource, RateLimits};
use gsa_core::refresh::RefreshIntervalStore;
use gsa_core::selection::SelectionStore;
use gsa_core::update::UpdateChecker;
use tokio::sync::Notify;

pub const GOOD_TOKEN: &str = "ghp_good";
pub const USERNAME: &str = "alice";

#[derive(Default)]
pub struct MemorySelectionStore {
    pub repos: Mutex<Vec<String>>,
    pub saves: AtomicUsize,
    pub fail: AtomicBool,
}

impl MemorySelectionStore {
    pub fn with(repos: &[&str]) -> Self {
        let store = Self::default();
        *store.repos.lock().unwrap() = repos.iter().map(|r| r.to_string()).collect();
        store
    }

    pub fn current(&self) -> Vec<String> {
        self.repos.lock().unwrap().clone()
    }
}

#[async_trait]
impl SelectionStore for MemorySelectionStore {
    async fn get_selected_repos(&self) -> Result<Vec<String>> {
        Ok(self.current())
    }

    async fn set_selected_repos(&self, full_names: Vec<String>) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GsaError::io("disk full"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.repos.lock().unwrap() = full_names;
        Ok(())
    }
}

pub struct MemoryIntervalStore {
    pub minutes: Mutex<Result<u32>>,
}

impl MemoryIntervalStore {
    pub fn with(minutes: Result<u32>) -> Self {
        Self {
            minutes: Mutex::new(minutes),
        }
    }
}

#[async_trait]
impl RefreshIntervalStore for MemoryIntervalStore {
    async fn get_refresh_interval(&self) -> Result<u32> {
        self.minutes.lock().unwrap().clone()
    }

    async fn set_refresh_interval(&self, minutes: u32) -> Result<()> {
        *self.minutes.lock().unwrap() = Ok(minutes);
        Ok(())
    }
}

/// Owners and repositories from a fixed table. Repository fetches wait on
/// `gate` when one is set.
pub struct ScriptedDirectory {
    pub owners: Vec<Owner>,
    pub repos: HashMap<String, Vec<Repository>>,
    pub repo_calls: Mutex<Vec<String>>,
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedDirectory {
    pub fn new(owners: Vec<Owner>, repos: &[&str]) -> Self {
        let mut by_owner: HashMap<String, Vec<Repository>> = HashMap::new();
        for full_name in repos {
            let repo = Repository::from_full_name(*full_name);
            by_owner.entry(repo.owner.clone()).or_default().push(repo);
        }
        Self {
            owners,
            repos: by_owner,
            repo_calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl OwnerDirectory for ScriptedDirectory {
    async fn get_owners(&self) -> Result<Vec<Owner>> {
        Ok(self.owners.clone())
    }

    async fn get_repos_for_owner(&self, owner: &str, _is_user: bool) -> Result<Vec<Repository>> {
        self.repo_calls.lock().unwrap().push(owner.to_string());
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut repos = self.repos.get(owner).cloned().unwrap_or_default();
        // The controller must ignore whatever `selected` comes back.
        for repo in &mut repos {
            repo.selected = true;
        }
        Ok(repos)
    }
}

/// One open alert per requested repository.
///
/// `hold` parks every call on one shared gate. `hold_each` gives each later
/// call a gate of its own, in call order, so responses can be released out
/// of order.
#[derive(Default)]
pub struct CountingAlerts {
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<Vec<String>>>,
    pub gate: Mutex<Option<Arc<Notify>>>,
    pub per_call: AtomicBool,
    pub held: Mutex<Vec<Arc<Notify>>>,
    pub fail_next: AtomicBool,
}

impl CountingAlerts {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn hold_each(&self) {
        self.per_call.store(true, Ordering::SeqCst);
    }

    /// Lets the `index`-th held call return.
    pub fn release(&self, index: usize) {
        self.held.lock().unwrap()[index].notify_one();
    }

    pub fn held_count(&self) -> usize {
        self.held.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertsSource for CountingAlerts {
    async fn get_security_alerts(&self, full_names: &[String]) -> Result<AlertsResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(full_names.to_vec());
        let gate = if self.per_call.load(Ordering::SeqCst) {
            let gate = Arc::new(Notify::new());
            self.held.lock().unwrap().push(gate.clone());
            Some(gate)
        } else {
            self.gate.lock().unwrap().clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GsaError::transient("alerts", "HTTP 502"));
        }
        Ok(AlertsResponse::from_repos(
            full_names
                .iter()
                .map(|name| RepoAlerts {
                    name: name.clone(),
                    alerts: 1,
                    dependabot_enabled: true,
                })
                .collect(),
        ))
    }
}

/// Accepts only [`GOOD_TOKEN`].
pub struct FakeAuth {
    pub token: Mutex<Option<String>>,
    pub selection: Arc<MemorySelectionStore>,
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn get_auth_status(&self) -> Result<AuthStatus> {
        let mut token = self.token.lock().unwrap();
        match token.as_deref() {
            Some(GOOD_TOKEN) => Ok(AuthStatus::signed_in(USERNAME)),
            Some(_) => {
                *token = None;
                Ok(AuthStatus::signed_out())
            }
            None => Ok(AuthStatus::signed_out()),
        }
    }

    async fn set_token(&self, token: &str) -> Result<()> {
        if token != GOOD_TOKEN {
            return Err(GsaError::auth("Invalid token"));
        }
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    async fn get_token(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap().clone())
    }

    async fn logout(&self) -> Result<()> {
        *self.token.lock().unwrap() = None;
        self.selection.set_selected_repos(Vec::new()).await
    }
}

/// Delivers [`GOOD_TOKEN`] after `delay`.
pub struct DelayedOAuth {
    pub delay: Duration,
}

#[async_trait]
impl OAuthBackend for DelayedOAuth {
    async fn start_oauth_flow(&self) -> Result<String> {
        Ok("https://github.com/login/oauth/authorize?client_id=test".to_string())
    }

    async fn complete_oauth_flow(&self) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(GOOD_TOKEN.to_string())
    }
}

#[derive(Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl LinkOpener for RecordingOpener {
    async fn open(&self, url: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GsaError::io("no browser"));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingTray {
    pub counts: Mutex<Vec<usize>>,
}

impl RecordingTray {
    pub fn last(&self) -> Option<usize> {
        self.counts.lock().unwrap().last().copied()
    }
}

#[async_trait]
impl TrayNotifier for RecordingTray {
    async fn update_tray_icon(&self, count: usize) -> Result<()> {
        self.counts.lock().unwrap().push(count);
        Ok(())
    }
}

/// A core budget that shrinks by one on every read.
#[derive(Default)]
pub struct CountingRateLimits {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingRateLimits {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimitSource for CountingRateLimits {
    async fn get_rate_limits(&self) -> Result<Option<RateLimits>> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(GsaError::transient("rate limits", "HTTP 503"));
        }
        let budget = |limit: u64, used: u64| RateLimit {
            limit,
            remaining: limit - used,
            used,
            reset_at: 1_700_000_000,
        };
        Ok(Some(RateLimits {
            core: budget(5000, calls),
            search: budget(30, 0),
            graphql: None,
        }))
    }
}

#[derive(Default)]
pub struct CountingUpdates {
    pub calls: AtomicUsize,
}

#[async_trait]
impl UpdateChecker for CountingUpdates {
    async fn check_for_updates(&self) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

pub struct Harness {
    pub controller: Arc<SessionController>,
    pub selection: Arc<MemorySelectionStore>,
    pub intervals: Arc<MemoryIntervalStore>,
    pub directory: Arc<ScriptedDirectory>,
    pub alerts: Arc<CountingAlerts>,
    pub rate_limits: Arc<CountingRateLimits>,
    pub auth: Arc<FakeAuth>,
    pub opener: Arc<RecordingOpener>,
    pub tray: Arc<RecordingTray>,
    pub updates: Arc<CountingUpdates>,
}

pub struct HarnessBuilder {
    token: Option<String>,
    selected: Vec<&'static str>,
    interval: Result<u32>,
    oauth_delay: Duration,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            token: None,
            selected: Vec::new(),
            interval: Ok(60),
            oauth_delay: Duration::from_secs(1),
        }
    }
}

impl HarnessBuilder {
    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn selected(mut self, repos: &[&'static str]) -> Self {
        self.selected = repos.to_vec();
        self
    }

    pub fn interval(mut self, interval: Result<u32>) -> Self {
        self.interval = interval;
        self
    }

    pub fn oauth_delay(mut self, delay: Duration) -> Self {
        self.oauth_delay = delay;
        self
    }

    /// Owners `alice` (user) and `acme` (organization).
    pub fn build(self) -> Harness {
        let selection = Arc::new(MemorySelectionStore::with(&self.selected));
        let intervals = Arc::new(MemoryIntervalStore::with(self.interval));
        let directory = Arc::new(ScriptedDirectory::new(
            vec![Owner::user(USERNAME), Owner::organization("acme")],
            &["alice/dots", "alice/notes", "acme/api", "acme/web", "acme/ci-tools"],
        ));
        let alerts = Arc::new(CountingAlerts::default());
        let rate_limits = Arc::new(CountingRateLimits::default());
        let auth = Arc::new(FakeAuth {
            token: Mutex::new(self.token),
            selection: selection.clone(),
        });
        let opener = Arc::new(RecordingOpener::default());
        let tray = Arc::new(RecordingTray::default());
        let updates = Arc::new(CountingUpdates::default());

        let controller = SessionController::create(Collaborators {
            directory: directory.clone(),
            alerts: alerts.clone(),
            rate_limits: rate_limits.clone(),
            auth: auth.clone(),
            oauth: Arc::new(DelayedOAuth {
                delay: self.oauth_delay,
            }),
            opener: opener.clone(),
            selection_store: selection.clone(),
            interval_store: intervals.clone(),
            tray: tray.clone(),
            updates: updates.clone(),
            handshake_deadline: Duration::from_secs(30),
        });

        Harness {
            controller,
            selection,
            intervals,
            directory,
            alerts,
            rate_limits,
            auth,
            opener,
            tray,
            updates,
        }
    }
}

pub fn harness() -> HarnessBuilder {
    HarnessBuilder::default()
}

/// Lets spawned tasks run until `done` holds, without advancing time.
pub async fn settle_until(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
