//! Owner and repository models.

use serde::{Deserialize, Serialize};

/// A GitHub user or organization that holds repositories.
///
/// Identity key is `name`, compared case-sensitively as provided by the
/// listing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    /// `true` for the authenticated user's own account, `false` for an
    /// organization.
    pub is_user: bool,
}

impl Owner {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_user: true,
        }
    }

    pub fn organization(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_user: false,
        }
    }
}

/// A repository as shown in the owner hierarchy.
///
/// `selected` mirrors ledger membership for display. It is never the source
/// of truth: the selection ledger is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Globally unique, `"owner/name"`.
    pub full_name: String,
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub selected: bool,
}

impl Repository {
    /// Builds an unselected repository from its `"owner/name"` form.
    ///
    /// Falls back to an empty owner when the name has no slash.
    pub fn from_full_name(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let (owner, name) = match full_name.split_once('/') {
            Some((owner, name)) => (owner.to_string(), name.to_string()),
            None => (String::new(), full_name.clone()),
        };
        Self {
            full_name,
            name,
            owner,
            selected: false,
        }
    }
}
