//! Authentication for the submission endpoint (§4.8).

pub mod clerk;

pub use clerk::{AuthError, AuthenticatedCaller, UserContext};
