//! Selection store trait.

use async_trait::async_trait;

use crate::error::Result;

/// Persisted selection store.
///
/// Always receives and returns the complete membership, never a delta.
#[async_trait]
pub trait SelectionStore: Send + Sync {
    async fn get_selected_repos(&self) -> Result<Vec<String>>;

    async fn set_selected_repos(&self, full_names: Vec<String>) -> Result<()>;
}
