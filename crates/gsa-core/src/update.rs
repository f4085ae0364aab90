//! Application update checks.

use async_trait::async_trait;

use crate::error::Result;

/// Checks whether a newer application build is published. Installing it is
/// the caller's concern.
#[async_trait]
pub trait UpdateChecker: Send + Sync {
    async fn check_for_updates(&self) -> Result<bool>;
}
