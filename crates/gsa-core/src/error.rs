//! Error types for GitHub Security Alerts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire application.
///
/// Every failure of an external call is converted into one of these variants
/// at the point of call. None of them is fatal: each leaves the session in a
/// state from which the same or another operation can be retried.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GsaError {
    /// Owner/repository listing or alert fetch failed. Recoverable by retry
    /// or by the next scheduled tick; already loaded data is kept.
    #[error("Failed to fetch {context}: {message}")]
    TransientFetch { context: String, message: String },

    /// Selection or config save failed. In-memory state is kept as-is.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Token rejected or expired.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The authorization exchange did not complete before its deadline.
    #[error("Authorization timed out after {after_secs}s")]
    HandshakeTimeout { after_secs: u64 },

    /// The authorization exchange was rejected by the external collaborator.
    #[error("Authorization rejected: {0}")]
    HandshakeRejected(String),

    /// A login attempt is already running.
    #[error("An authorization is already in progress")]
    HandshakeInProgress,

    /// A persisted configuration value could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    /// The owner node has an in-flight children fetch.
    #[error("Repositories for '{owner}' are still loading")]
    NodeLoading { owner: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Caller supplied an unusable value.
    #[error("{0}")]
    InvalidInput(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GsaError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a TransientFetch error
    pub fn transient(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransientFetch {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a ConfigParse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFetch { .. })
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// True for the outcomes that end a handshake session.
    pub fn is_handshake_terminal(&self) -> bool {
        matches!(
            self,
            Self::HandshakeTimeout { .. } | Self::HandshakeRejected(_)
        )
    }

    /// Short, stable name of the error kind, used by the error slot.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransientFetch { .. } => "transient_fetch",
            Self::Persistence(_) => "persistence",
            Self::Auth(_) => "auth",
            Self::HandshakeTimeout { .. } => "handshake_timeout",
            Self::HandshakeRejected(_) => "handshake_rejected",
            Self::HandshakeInProgress => "handshake_in_progress",
            Self::ConfigParse(_) => "config_parse",
            Self::NodeLoading { .. } => "node_loading",
            Self::NotFound { .. } => "not_found",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for GsaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for GsaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for GsaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for GsaError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, GsaError>`.
pub type Result<T> = std::result::Result<T, GsaError>;
