//! OAuth handshake coordinator.
//!
//! At most one session is live. [`HandshakeCoordinator::begin`] races the
//! exchange (open URL, then wait for the external callback) against a fixed
//! deadline; whichever settles first decides the outcome and the other is
//! dropped. Settlement is keyed on the session id, so a continuation that
//! belongs to a session which is no longer live changes nothing. Every
//! terminal outcome returns the coordinator to idle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::service::{LinkOpener, OAuthBackend};
use crate::error::{GsaError, Result};

pub const DEFAULT_HANDSHAKE_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum HandshakePhase {
    Idle,
    /// External browser opened (or opening); waiting for the callback.
    Awaiting { session_id: Uuid },
}

/// Terminal result of the most recent session. The token itself is handed
/// to the caller of `begin` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum HandshakeOutcome {
    Completed,
    TimedOut,
    Failed(String),
}

#[derive(Debug, Default)]
struct HandshakeState {
    live: Option<Uuid>,
    last_outcome: Option<HandshakeOutcome>,
}

pub struct HandshakeCoordinator {
    backend: Arc<dyn OAuthBackend>,
    opener: Arc<dyn LinkOpener>,
    deadline: Duration,
    state: Mutex<HandshakeState>,
}

impl HandshakeCoordinator {
    pub fn new(backend: Arc<dyn OAuthBackend>, opener: Arc<dyn LinkOpener>) -> Self {
        Self::with_deadline(backend, opener, DEFAULT_HANDSHAKE_DEADLINE)
    }

    pub fn with_deadline(
        backend: Arc<dyn OAuthBackend>,
        opener: Arc<dyn LinkOpener>,
        deadline: Duration,
    ) -> Self {
        Self {
            backend,
            opener,
            deadline,
            state: Mutex::new(HandshakeState::default()),
        }
    }

    pub fn phase(&self) -> HandshakePhase {
        match self.lock().live {
            Some(session_id) => HandshakePhase::Awaiting { session_id },
            None => HandshakePhase::Idle,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.lock().live.is_some()
    }

    pub fn last_outcome(&self) -> Option<HandshakeOutcome> {
        self.lock().last_outcome.clone()
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Runs one authorization exchange and returns the token.
    ///
    /// Fails with `HandshakeInProgress` while another session is live,
    /// `HandshakeTimeout` when the deadline wins, and `HandshakeRejected`
    /// when the backend or the link opener fails.
    pub async fn begin(&self) -> Result<String> {
        let mut session = self.claim()?;
        tracing::info!(target: "handshake", session_id = %session.id, "authorization started");

        let result = tokio::select! {
            exchanged = self.exchange() => exchanged,
            _ = tokio::time::sleep(self.deadline) => Err(GsaError::HandshakeTimeout {
                after_secs: self.deadline.as_secs(),
            }),
        };

        let outcome = match &result {
            Ok(_) => HandshakeOutcome::Completed,
            Err(GsaError::HandshakeTimeout { .. }) => HandshakeOutcome::TimedOut,
            Err(e) => HandshakeOutcome::Failed(e.to_string()),
        };
        session.settle(outcome);
        result
    }

    async fn exchange(&self) -> Result<String> {
        let url = self
            .backend
            .start_oauth_flow()
            .await
            .map_err(|e| GsaError::HandshakeRejected(e.to_string()))?;
        self.opener
            .open(&url)
            .await
            .map_err(|e| GsaError::HandshakeRejected(format!("could not open browser: {}", e)))?;
        tracing::debug!(target: "handshake", "waiting for authorization callback");
        self.backend
            .complete_oauth_flow()
            .await
            .map_err(|e| GsaError::HandshakeRejected(e.to_string()))
    }

    fn claim(&self) -> Result<LiveSession<'_>> {
        let mut state = self.lock();
        if state.live.is_some() {
            tracing::debug!(target: "handshake", "begin rejected, session already live");
            return Err(GsaError::HandshakeInProgress);
        }
        let id = Uuid::new_v4();
        state.live = Some(id);
        Ok(LiveSession {
            coordinator: self,
            id,
            settled: false,
        })
    }

    /// Records a terminal outcome if `session_id` is still the live session.
    fn settle(&self, session_id: Uuid, outcome: HandshakeOutcome) -> bool {
        let mut state = self.lock();
        if state.live != Some(session_id) {
            tracing::debug!(target: "handshake", %session_id, "ignoring settlement of stale session");
            return false;
        }
        tracing::info!(target: "handshake", %session_id, ?outcome, "authorization settled");
        state.live = None;
        state.last_outcome = Some(outcome);
        true
    }

    fn lock(&self) -> MutexGuard<'_, HandshakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live-session guard. Settles as failed if the `begin` future is dropped
/// before reaching an outcome, so the coordinator never stays claimed.
struct LiveSession<'a> {
    coordinator: &'a HandshakeCoordinator,
    id: Uuid,
    settled: bool,
}

impl LiveSession<'_> {
    fn settle(&mut self, outcome: HandshakeOutcome) {
        self.settled = true;
        self.coordinator.settle(self.id, outcome);
    }
}

impl Drop for LiveSession<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator
                .settle(self.id, HandshakeOutcome::Failed("abandoned".to_string()));
        }
    }
}
