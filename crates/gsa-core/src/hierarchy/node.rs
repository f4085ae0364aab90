use serde::{Deserialize, Serialize};

use crate::owner::{Owner, Repository};

/// One owner entry of the hierarchy.
///
/// `children` is filled exactly once per session, on first expansion;
/// `loaded` never goes back to `false`. `loading` is `true` only while a
/// children fetch is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerNode {
    pub owner: Owner,
    pub expanded: bool,
    pub loading: bool,
    pub loaded: bool,
    pub children: Vec<Repository>,
}

impl OwnerNode {
    pub fn new(owner: Owner) -> Self {
        Self {
            owner,
            expanded: false,
            loading: false,
            loaded: false,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.owner.name
    }

    pub fn child(&self, full_name: &str) -> Option<&Repository> {
        self.children.iter().find(|r| r.full_name == full_name)
    }

    pub fn child_mut(&mut self, full_name: &str) -> Option<&mut Repository> {
        self.children.iter_mut().find(|r| r.full_name == full_name)
    }

    /// Selected children among those loaded. Display helper only; counts
    /// that must be correct for unloaded owners come from the ledger.
    pub fn loaded_selected_count(&self) -> usize {
        self.children.iter().filter(|r| r.selected).count()
    }
}
