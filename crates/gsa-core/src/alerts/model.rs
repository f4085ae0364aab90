use serde::{Deserialize, Serialize};

/// Open alert count of one watched repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoAlerts {
    /// Repository full name.
    pub name: String,
    pub alerts: usize,
    /// `false` when the repository rejected the alerts request (Dependabot
    /// disabled, or the response was unusable).
    pub dependabot_enabled: bool,
}

/// Alert summary across every watched repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub total_alerts: usize,
    pub repos: Vec<RepoAlerts>,
}

impl AlertsResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a summary, totalling the per-repository counts.
    pub fn from_repos(repos: Vec<RepoAlerts>) -> Self {
        Self {
            total_alerts: repos.iter().map(|r| r.alerts).sum(),
            repos,
        }
    }

    pub fn repos_with_alerts(&self) -> impl Iterator<Item = &RepoAlerts> {
        self.repos.iter().filter(|r| r.alerts > 0)
    }
}

/// Tooltip shown on the tray icon for a given alert count.
pub fn tray_tooltip(count: usize) -> String {
    if count == 0 {
        "GitHub Security Alerts - No alerts".to_string()
    } else {
        format!("GitHub Security Alerts - {} alert(s)!", count)
    }
}
