//! Session-scoped controller.

mod collaborators;
mod session;
mod state;

pub use collaborators::Collaborators;
pub use session::SessionController;
