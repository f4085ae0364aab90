//! Authentication collaborator traits.

use async_trait::async_trait;

use super::model::AuthStatus;
use crate::error::Result;

/// Token verification and session ownership on the backend side.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies the stored token. A rejected token is cleared and reported
    /// as signed out, not as an error.
    async fn get_auth_status(&self) -> Result<AuthStatus>;

    /// Verifies and stores a personal access token.
    async fn set_token(&self, token: &str) -> Result<()>;

    async fn get_token(&self) -> Result<Option<String>>;

    /// Forgets the token and the persisted selection.
    async fn logout(&self) -> Result<()>;
}

/// Raw token persistence.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load_token(&self) -> Result<Option<String>>;

    async fn save_token(&self, token: Option<String>) -> Result<()>;
}

/// The two halves of the OAuth exchange.
#[async_trait]
pub trait OAuthBackend: Send + Sync {
    /// Prepares the exchange and returns the authorization URL to open.
    async fn start_oauth_flow(&self) -> Result<String>;

    /// Resolves once the external callback delivers a token. May never
    /// resolve; callers bound it with a deadline.
    async fn complete_oauth_flow(&self) -> Result<String>;
}

/// Opens a URL outside the application (system browser).
#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open(&self, url: &str) -> Result<()>;
}
