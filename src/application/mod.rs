// Application layer - use cases and orchestration.
// Callers (the CLI, or any other front end) resolve who is acting and
// hand the service an owner or account id; authentication is theirs.

pub mod error;
pub mod form;
pub mod service;

pub use error::*;
pub use form::*;
pub use service::*;
