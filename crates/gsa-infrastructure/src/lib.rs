//! Infrastructure adapters for GitHub Security Alerts.
//!
//! File-backed configuration, the GitHub REST backend, and the system link
//! opener. Everything here implements a trait from `gsa-core`.

pub mod config_service;
pub mod github;
pub mod link_opener;
pub mod paths;
pub mod storage;

pub use crate::config_service::FileConfigService;
pub use crate::github::GitHubClient;
pub use crate::link_opener::SystemLinkOpener;
