//! Owner directory trait.

use async_trait::async_trait;

use super::model::{Owner, Repository};
use crate::error::Result;

/// Listing collaborator for owners and their repositories.
#[async_trait]
pub trait OwnerDirectory: Send + Sync {
    /// Lists the authenticated user first, then their organizations.
    async fn get_owners(&self) -> Result<Vec<Owner>>;

    /// Lists every repository of an owner.
    ///
    /// Implementations must exhaust pagination before returning: callers
    /// treat the result as the complete set for that owner. The `selected`
    /// field of the returned repositories is ignored.
    async fn get_repos_for_owner(&self, owner: &str, is_user: bool) -> Result<Vec<Repository>>;
}
