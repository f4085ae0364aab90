//! The selection ledger.
//!
//! Membership here is the single source of truth for "is this repository
//! watched", including repositories whose owner has never been expanded.
//! Every mutation persists the entire membership, so a partially loaded
//! session can never save a shrunken selection.
//!
//! A failed save does not roll the in-memory state back: the change is
//! already visible, and the next mutation (or an explicit [`persist`])
//! saves the full set again.
//!
//! [`persist`]: SelectionLedger::persist

use std::collections::HashSet;
use std::sync::Arc;

use super::store::SelectionStore;
use crate::error::{GsaError, Result};

pub struct SelectionLedger {
    selected: HashSet<String>,
    store: Arc<dyn SelectionStore>,
}

impl SelectionLedger {
    /// Creates an empty ledger backed by `store`.
    pub fn new(store: Arc<dyn SelectionStore>) -> Self {
        Self {
            selected: HashSet::new(),
            store,
        }
    }

    pub fn is_selected(&self, full_name: &str) -> bool {
        self.selected.contains(full_name)
    }

    /// Sets membership of one repository and persists the full set.
    ///
    /// Any string is accepted, since it may belong to an owner that has not
    /// been loaded yet.
    pub async fn set_selected(&mut self, full_name: &str, selected: bool) -> Result<()> {
        if selected {
            self.selected.insert(full_name.to_string());
        } else {
            self.selected.remove(full_name);
        }
        tracing::debug!(full_name, selected, total = self.selected.len(), "ledger updated");
        self.persist().await
    }

    /// Adds every given name; membership of other names is untouched.
    pub async fn select_all<I, S>(&mut self, full_names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.extend(full_names.into_iter().map(Into::into));
        self.persist().await
    }

    /// Removes every given name; membership of other names is untouched.
    pub async fn select_none<I, S>(&mut self, full_names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in full_names {
            self.selected.remove(name.as_ref());
        }
        self.persist().await
    }

    /// Replaces the entire membership without persisting.
    ///
    /// Called once at session start with what the store returned, before any
    /// hierarchy fetch completes.
    pub fn restore<I>(&mut self, full_names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.selected = full_names.into_iter().collect();
        tracing::debug!(total = self.selected.len(), "ledger restored");
    }

    /// Reads the persisted membership and restores it.
    pub async fn load(&mut self) -> Result<usize> {
        let persisted = self.store.get_selected_repos().await?;
        self.restore(persisted);
        Ok(self.selected.len())
    }

    /// Saves the complete current membership.
    pub async fn persist(&self) -> Result<()> {
        self.store
            .set_selected_repos(self.snapshot())
            .await
            .map_err(|e| match e {
                GsaError::Persistence(_) => e,
                other => GsaError::persistence(other.to_string()),
            })
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    /// Number of selected repositories under `owner`, loaded or not.
    pub fn count_for_owner(&self, owner: &str) -> usize {
        self.selected
            .iter()
            .filter(|name| {
                name.split_once('/')
                    .is_some_and(|(repo_owner, _)| repo_owner == owner)
            })
            .count()
    }

    /// Current membership, sorted for stable persistence.
    pub fn snapshot(&self) -> Vec<String> {
        let mut names: Vec<String> = self.selected.iter().cloned().collect();
        names.sort();
        names
    }

    /// Forgets all membership in memory. Used on logout; the backend clears
    /// its own persisted copy.
    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
