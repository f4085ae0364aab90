//! Repository selection: the authoritative ledger, its persistence seam, and
//! the reconciler that mirrors ledger truth into loaded hierarchy nodes.

mod ledger;
mod reconciler;
mod store;

pub use ledger::SelectionLedger;
pub use reconciler::SelectionReconciler;
pub use store::SelectionStore;
