//! Lazy owner hierarchy.
//!
//! Expansion is split in two synchronous halves around the children fetch:
//! [`HierarchyCache::begin_expand`] decides what to do and marks the node
//! loading, [`HierarchyCache::complete_expand`] applies the fetched children
//! through the reconciler. Callers that share the cache behind a lock release
//! it between the halves; [`HierarchyCache::expand`] chains both for callers
//! that own the cache outright.

use serde::{Deserialize, Serialize};

use super::node::OwnerNode;
use crate::error::{GsaError, Result};
use crate::owner::{Owner, OwnerDirectory, Repository};
use crate::selection::{SelectionLedger, SelectionReconciler};

/// What the first half of an expansion decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandStep {
    /// Node was open and loaded; it is now closed.
    Collapsed,
    /// A fetch is already in flight for this node; nothing changed.
    AlreadyLoading,
    /// Node was already loaded; it is now open.
    Expanded,
    /// Node is open and marked loading; children must be fetched for this
    /// owner and handed to `complete_expand`.
    Fetch(Owner),
}

/// Caller-visible result of an expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandOutcome {
    Collapsed,
    AlreadyLoading,
    Expanded,
    Loaded { count: usize },
}

#[derive(Debug, Default, Clone)]
pub struct HierarchyCache {
    nodes: Vec<OwnerNode>,
}

impl HierarchyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds one unloaded node per owner, in the given order. The first node
    /// starts expanded.
    pub fn initialize(&mut self, owners: Vec<Owner>) -> &[OwnerNode] {
        self.nodes = owners
            .into_iter()
            .enumerate()
            .map(|(index, owner)| {
                let mut node = OwnerNode::new(owner);
                node.expanded = index == 0;
                node
            })
            .collect();
        tracing::debug!(owners = self.nodes.len(), "hierarchy initialized");
        &self.nodes
    }

    pub fn nodes(&self) -> &[OwnerNode] {
        &self.nodes
    }

    pub fn node(&self, owner: &str) -> Option<&OwnerNode> {
        self.nodes.iter().find(|n| n.owner.name == owner)
    }

    pub fn node_mut(&mut self, owner: &str) -> Option<&mut OwnerNode> {
        self.nodes.iter_mut().find(|n| n.owner.name == owner)
    }

    pub fn first_owner(&self) -> Option<&str> {
        self.nodes.first().map(OwnerNode::name)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of repositories loaded so far, across all nodes.
    pub fn total_repos_count(&self) -> usize {
        self.nodes.iter().map(|n| n.children.len()).sum()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// First half of an expansion.
    pub fn begin_expand(&mut self, owner: &str) -> Result<ExpandStep> {
        let node = self
            .node_mut(owner)
            .ok_or_else(|| GsaError::not_found("owner", owner))?;

        if node.expanded && node.loaded {
            node.expanded = false;
            return Ok(ExpandStep::Collapsed);
        }
        if node.loading {
            return Ok(ExpandStep::AlreadyLoading);
        }

        node.expanded = true;
        if node.loaded {
            return Ok(ExpandStep::Expanded);
        }

        node.loading = true;
        tracing::debug!(owner, "fetching repositories");
        Ok(ExpandStep::Fetch(node.owner.clone()))
    }

    /// Second half of an expansion.
    ///
    /// On success the fresh children go through the reconciler before the
    /// node is marked loaded. On failure the error is returned, `loading` is
    /// cleared and `loaded` stays `false` so a later expansion retries.
    ///
    /// A result for a node that is no longer loading (the hierarchy was
    /// cleared or rebuilt meanwhile) is dropped.
    pub fn complete_expand(
        &mut self,
        owner: &str,
        fetched: Result<Vec<Repository>>,
        ledger: &SelectionLedger,
    ) -> Result<ExpandOutcome> {
        let Some(node) = self.node_mut(owner).filter(|n| n.loading) else {
            tracing::debug!(owner, "dropping children for a node that is not loading");
            return Err(GsaError::not_found("loading owner", owner));
        };

        node.loading = false;
        match fetched {
            Ok(repos) => {
                SelectionReconciler::apply(node, repos, ledger);
                node.loaded = true;
                Ok(ExpandOutcome::Loaded {
                    count: node.children.len(),
                })
            }
            Err(e) => {
                tracing::warn!(owner, error = %e, "failed to load repositories");
                Err(match e {
                    GsaError::TransientFetch { .. } | GsaError::Auth(_) => e,
                    other => {
                        GsaError::transient(format!("repos for {}", owner), other.to_string())
                    }
                })
            }
        }
    }

    /// Full expansion against a listing collaborator.
    pub async fn expand(
        &mut self,
        owner: &str,
        directory: &dyn OwnerDirectory,
        ledger: &SelectionLedger,
    ) -> Result<ExpandOutcome> {
        match self.begin_expand(owner)? {
            ExpandStep::Collapsed => Ok(ExpandOutcome::Collapsed),
            ExpandStep::AlreadyLoading => Ok(ExpandOutcome::AlreadyLoading),
            ExpandStep::Expanded => Ok(ExpandOutcome::Expanded),
            ExpandStep::Fetch(target) => {
                let fetched = directory
                    .get_repos_for_owner(&target.name, target.is_user)
                    .await;
                self.complete_expand(owner, fetched, ledger)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct ScriptedDirectory {
        repos: HashMap<String, Vec<Repository>>,
        calls: Mutex<Vec<(String, bool)>>,
        fail_once: Mutex<bool>,
    }

    impl ScriptedDirectory {
        fn new(entries: &[(&str, &[&str])]) -> Self {
            let repos = entries
                .iter()
                .map(|(owner, names)| {
                    let repos = names
                        .iter()
                        .map(|n| Repository::from_full_name(format!("{}/{}", owner, n)))
                        .collect();
                    (owner.to_string(), repos)
                })
                .collect();
            Self {
                repos,
                calls: Mutex::new(Vec::new()),
                fail_once: Mutex::new(false),
            }
        }
    }

    #[async_trait]
    impl OwnerDirectory for ScriptedDirectory {
        async fn get_owners(&self) -> Result<Vec<Owner>> {
            Ok(Vec::new())
        }

        async fn get_repos_for_owner(&self, owner: &str, is_user: bool) -> Result<Vec<Repository>> {
            self.calls.lock().unwrap().push((owner.to_string(), is_user));
            let mut fail = self.fail_once.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(GsaError::transient("repos", "502 Bad Gateway"));
            }
            Ok(self.repos.get(owner).cloned().unwrap_or_default())
        }
    }

    fn owners() -> Vec<Owner> {
        vec![Owner::user("alice"), Owner::organization("acme")]
    }

    fn ledger() -> SelectionLedger {
        SelectionLedger::new(Arc::new(MemoryStore::default()))
    }

    #[test]
    fn test_initialize_expands_only_first() {
        let mut cache = HierarchyCache::new();
        let nodes = cache.initialize(owners());
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].expanded);
        assert!(!nodes[1].expanded);
        assert!(nodes.iter().all(|n| !n.loaded && !n.loading));
    }

    #[tokio::test]
    async fn test_expand_fetches_once_then_toggles() {
        let directory = ScriptedDirectory::new(&[("acme", &["api", "web"])]);
        let ledger = ledger();
        let mut cache = HierarchyCache::new();
        cache.initialize(owners());

        let outcome = cache.expand("acme", &directory, &ledger).await.unwrap();
        assert_eq!(outcome, ExpandOutcome::Loaded { count: 2 });
        assert_eq!(
            directory.calls.lock().unwrap().as_slice(),
            &[("acme".to_string(), false)]
        );

        let outcome = cache.expand("acme", &directory, &ledger).await.unwrap();
        assert_eq!(outcome, ExpandOutcome::Collapsed);
        assert!(!cache.node("acme").unwrap().expanded);

        let outcome = cache.expand("acme", &directory, &ledger).await.unwrap();
        assert_eq!(outcome, ExpandOutcome::Expanded);
        assert_eq!(directory.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pre_expanded_first_node_still_loads() {
        let directory = ScriptedDirectory::new(&[("alice", &["dots"])]);
        let ledger = ledger();
        let mut cache = HierarchyCache::new();
        cache.initialize(owners());

        let outcome = cache.expand("alice", &directory, &ledger).await.unwrap();
        assert_eq!(outcome, ExpandOutcome::Loaded { count: 1 });
        assert_eq!(
            directory.calls.lock().unwrap().as_slice(),
            &[("alice".to_string(), true)]
        );
    }

    #[test]
    fn test_second_toggle_while_loading_is_noop() {
        let mut cache = HierarchyCache::new();
        cache.initialize(owners());

        assert!(matches!(
            cache.begin_expand("acme").unwrap(),
            ExpandStep::Fetch(_)
        ));
        assert_eq!(
            cache.begin_expand("acme").unwrap(),
            ExpandStep::AlreadyLoading
        );
        assert!(cache.node("acme").unwrap().loading);
    }

    #[tokio::test]
    async fn test_failed_fetch_allows_retry() {
        let directory = ScriptedDirectory::new(&[("acme", &["api"])]);
        *directory.fail_once.lock().unwrap() = true;
        let ledger = ledger();
        let mut cache = HierarchyCache::new();
        cache.initialize(owners());

        let err = cache.expand("acme", &directory, &ledger).await.unwrap_err();
        assert!(err.is_transient());
        let node = cache.node("acme").unwrap();
        assert!(!node.loading);
        assert!(!node.loaded);

        let outcome = cache.expand("acme", &directory, &ledger).await.unwrap();
        assert_eq!(outcome, ExpandOutcome::Loaded { count: 1 });
    }

    #[test]
    fn test_children_keep_collaborator_order() {
        let ledger = ledger();
        let mut cache = HierarchyCache::new();
        cache.initialize(owners());
        cache.begin_expand("acme").unwrap();

        let fetched = vec![
            Repository::from_full_name("acme/zulu"),
            Repository::from_full_name("acme/alpha"),
        ];
        cache.complete_expand("acme", Ok(fetched), &ledger).unwrap();

        let names: Vec<&str> = cache
            .node("acme")
            .unwrap()
            .children
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["zulu", "alpha"]);
    }

    #[test]
    fn test_late_result_after_clear_is_dropped() {
        let ledger = ledger();
        let mut cache = HierarchyCache::new();
        cache.initialize(owners());
        cache.begin_expand("acme").unwrap();
        cache.clear();

        let result = cache.complete_expand(
            "acme",
            Ok(vec![Repository::from_full_name("acme/api")]),
            &ledger,
        );
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unknown_owner() {
        let mut cache = HierarchyCache::new();
        cache.initialize(owners());
        let err = cache.begin_expand("nobody").unwrap_err();
        assert_eq!(err, GsaError::not_found("owner", "nobody"));
    }
}
