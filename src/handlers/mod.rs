//! API handlers for the wallet SSO server

pub mod auth;
pub mod discovery;
pub mod user;

pub use auth::*;
pub use discovery::*;
pub use user::*;

// Re-export AuthenticatedUser from middleware for handler use
pub use crate::middleware::auth::AuthenticatedUser;
