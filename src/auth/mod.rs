//! Authentication module
//!
//! Supports: HTTP Basic, and a username/password token exchange
//!
//! The `Authenticator` applies credentials to every request and caches
//! the bearer token for token auth until it expires.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken};
