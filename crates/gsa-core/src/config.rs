//! Persisted application configuration.

use serde::{Deserialize, Serialize};

use crate::refresh::DEFAULT_REFRESH_INTERVAL_MINUTES;

/// Everything the application keeps between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub selected_repos: Vec<String>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u32,
}

fn default_refresh_interval() -> u32 {
    DEFAULT_REFRESH_INTERVAL_MINUTES
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            selected_repos: Vec::new(),
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
        }
    }
}
