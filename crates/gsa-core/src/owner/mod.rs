//! Owner and repository domain models and the listing collaborator trait.
//!
//! Owners are GitHub users or organizations; each holds repositories that
//! are listed lazily, one owner at a time.

mod model;
mod repository;

pub use model::{Owner, Repository};
pub use repository::OwnerDirectory;
