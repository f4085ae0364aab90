//! Domain layer for GitHub Security Alerts.
//!
//! Holds the models, the shared error type, the traits through which the
//! external backend is reached, and the session-independent components:
//! selection ledger, lazy owner hierarchy, reconciler, refresh scheduler and
//! OAuth handshake coordinator.

pub mod alerts;
pub mod auth;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod owner;
pub mod rate_limit;
pub mod refresh;
pub mod selection;
pub mod update;

#[cfg(test)]
mod test_support;

// Re-export common error type
pub use error::{GsaError, Result};
