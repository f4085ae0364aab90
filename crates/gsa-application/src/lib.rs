//! Application layer for GitHub Security Alerts.
//!
//! [`SessionController`] owns one instance of every core component for a
//! signed-in session and is the boundary a desktop shell calls into.

pub mod controller;
pub mod error_slot;
pub mod telemetry;

pub use controller::{Collaborators, SessionController};
pub use error_slot::{ErrorSlot, SurfacedError};
