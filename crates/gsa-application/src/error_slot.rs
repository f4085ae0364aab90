//! The single current-error slot shown to the user.
//!
//! There is no queue: each failure replaces the previous message, and a new
//! attempt clears it.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use gsa_core::GsaError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfacedError {
    /// Stable kind name, see [`GsaError::kind`].
    pub kind: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ErrorSlot {
    current: Mutex<Option<SurfacedError>>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, error: &GsaError) {
        self.set_message(error.kind(), error.to_string());
    }

    pub fn set_message(&self, kind: &str, message: impl Into<String>) {
        let surfaced = SurfacedError {
            kind: kind.to_string(),
            message: message.into(),
            occurred_at: Utc::now(),
        };
        *self.lock() = Some(surfaced);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Clears the slot only when it holds an error of `kind`.
    pub fn clear_kind(&self, kind: &str) {
        let mut current = self.lock();
        if current.as_ref().is_some_and(|e| e.kind == kind) {
            *current = None;
        }
    }

    pub fn current(&self) -> Option<SurfacedError> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SurfacedError>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
