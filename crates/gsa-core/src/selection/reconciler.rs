//! Merges ledger truth into loaded hierarchy nodes.
//!
//! Truth flows one way: UI event → ledger → persisted store. The only place
//! ledger state is copied back onto repositories is [`SelectionReconciler::apply`],
//! when a node's children arrive.

use super::ledger::SelectionLedger;
use crate::error::{GsaError, Result};
use crate::hierarchy::OwnerNode;
use crate::owner::Repository;

pub struct SelectionReconciler;

impl SelectionReconciler {
    /// Replaces `node.children` with `fresh`, each repository's `selected`
    /// taken from the ledger. Never reads the previous children.
    pub fn apply(node: &mut OwnerNode, fresh: Vec<Repository>, ledger: &SelectionLedger) {
        node.children = fresh
            .into_iter()
            .map(|mut repo| {
                repo.selected = ledger.is_selected(&repo.full_name);
                repo
            })
            .collect();
    }

    /// Flips one loaded repository and records it in the ledger.
    ///
    /// Rejected while the node is loading, since the pending `apply` would
    /// overwrite the children. A persistence failure is returned after both
    /// the repository and the ledger have changed.
    pub async fn toggle(
        node: &mut OwnerNode,
        full_name: &str,
        ledger: &mut SelectionLedger,
    ) -> Result<bool> {
        Self::ensure_settled(node)?;
        let repo = node
            .child_mut(full_name)
            .ok_or_else(|| GsaError::not_found("repository", full_name))?;

        repo.selected = !repo.selected;
        let selected = repo.selected;
        ledger.set_selected(full_name, selected).await?;
        Ok(selected)
    }

    /// Selects every loaded child of `node`.
    pub async fn select_all_for_owner(
        node: &mut OwnerNode,
        ledger: &mut SelectionLedger,
    ) -> Result<()> {
        Self::ensure_settled(node)?;
        for repo in &mut node.children {
            repo.selected = true;
        }
        ledger
            .select_all(node.children.iter().map(|r| r.full_name.clone()))
            .await
    }

    /// Deselects every loaded child of `node`.
    pub async fn select_none_for_owner(
        node: &mut OwnerNode,
        ledger: &mut SelectionLedger,
    ) -> Result<()> {
        Self::ensure_settled(node)?;
        for repo in &mut node.children {
            repo.selected = false;
        }
        ledger
            .select_none(node.children.iter().map(|r| r.full_name.as_str()))
            .await
    }

    /// Display projection: case-insensitive substring match on repository
    /// name or owner. A blank query returns every child in order.
    pub fn filter<'a>(node: &'a OwnerNode, query: &str) -> Vec<&'a Repository> {
        let query = query.trim();
        if query.is_empty() {
            return node.children.iter().collect();
        }
        let query = query.to_lowercase();
        node.children
            .iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&query) || r.owner.to_lowercase().contains(&query)
            })
            .collect()
    }

    fn ensure_settled(node: &OwnerNode) -> Result<()> {
        if node.loading {
            return Err(GsaError::NodeLoading {
                owner: node.owner.name.clone(),
            });
        }
        Ok(())
    }
}
