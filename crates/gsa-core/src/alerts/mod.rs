//! Dependabot alert summaries and the collaborators that fetch and display
//! them.

mod model;
mod source;

pub use model::{AlertsResponse, RepoAlerts, tray_tooltip};
pub use source::{AlertsSource, TrayNotifier};
