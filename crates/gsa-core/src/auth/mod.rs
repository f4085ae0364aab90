//! Authentication: status model, collaborator traits, and the
//! timeout-bounded OAuth handshake.

mod handshake;
mod model;
mod service;

pub use handshake::{
    DEFAULT_HANDSHAKE_DEADLINE, HandshakeCoordinator, HandshakeOutcome, HandshakePhase,
};
pub use model::AuthStatus;
pub use service::{AuthService, LinkOpener, OAuthBackend, TokenStore};
