use std::sync::Arc;
use std::time::Duration;

use gsa_core::alerts::{AlertsSource, TrayNotifier};
use gsa_core::auth::{AuthService, DEFAULT_HANDSHAKE_DEADLINE, LinkOpener, OAuthBackend};
use gsa_core::owner::OwnerDirectory;
use gsa_core::rate_limit::RateLimitSource;
use gsa_core::refresh::RefreshIntervalStore;
use gsa_core::selection::SelectionStore;
use gsa_core::update::UpdateChecker;
use gsa_infrastructure::{FileConfigService, GitHubClient, SystemLinkOpener};

/// Every external collaborator a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub directory: Arc<dyn OwnerDirectory>,
    pub alerts: Arc<dyn AlertsSource>,
    pub rate_limits: Arc<dyn RateLimitSource>,
    pub auth: Arc<dyn AuthService>,
    pub oauth: Arc<dyn OAuthBackend>,
    pub opener: Arc<dyn LinkOpener>,
    pub selection_store: Arc<dyn SelectionStore>,
    pub interval_store: Arc<dyn RefreshIntervalStore>,
    pub tray: Arc<dyn TrayNotifier>,
    pub updates: Arc<dyn UpdateChecker>,
    pub handshake_deadline: Duration,
}

impl Collaborators {
    /// Production wiring: GitHub over REST, settings in the config file,
    /// links in the system browser. The OAuth exchange, tray and updater
    /// belong to the desktop shell and are passed in.
    pub fn github(
        config: Arc<FileConfigService>,
        oauth: Arc<dyn OAuthBackend>,
        tray: Arc<dyn TrayNotifier>,
        updates: Arc<dyn UpdateChecker>,
    ) -> Self {
        let client = Arc::new(GitHubClient::new(config.clone(), config.clone()));
        Self {
            directory: client.clone(),
            alerts: client.clone(),
            rate_limits: client.clone(),
            auth: client,
            oauth,
            opener: Arc::new(SystemLinkOpener::new()),
            selection_store: config.clone(),
            interval_store: config,
            tray,
            updates,
            handshake_deadline: DEFAULT_HANDSHAKE_DEADLINE,
        }
    }
}
