use async_trait::async_trait;

use super::model::AlertsResponse;
use crate::error::Result;

/// Fetches open Dependabot alerts.
#[async_trait]
pub trait AlertsSource: Send + Sync {
    /// Summarises open alerts for the given repository full names.
    async fn get_security_alerts(&self, full_names: &[String]) -> Result<AlertsResponse>;
}

/// Reflects the alert count on the tray icon.
#[async_trait]
pub trait TrayNotifier: Send + Sync {
    async fn update_tray_icon(&self, count: usize) -> Result<()>;
}
