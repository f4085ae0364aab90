//! Two-level lazy owner → repository tree.

mod cache;
mod node;

pub use cache::{ExpandOutcome, ExpandStep, HierarchyCache};
pub use node::OwnerNode;
