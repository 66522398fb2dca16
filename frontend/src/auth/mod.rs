//! Authentication module for the portal's client-side session and access control.
//!
//! This module provides the public interface for the session lifecycle (boot,
//! login, refresh, logout), exact-match permission checks, and the route guard
//! that turns both into per-route decisions.

pub mod errors;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod service;

// Re-exports for convenience
pub use errors::*;
pub use middleware::*;
pub use models::*;
pub use permissions::*;
pub use routes::*;
pub use service::*;
