//! Core `adapters` crate for abstracting the portal's authentication endpoints.
//!
//! This crate defines the `AuthApi` trait, which outlines the three calls the
//! session core makes against the service-desk server (login, identity
//! verification, logout), and provides the concrete HTTP implementation used
//! in production.

pub mod errors;
pub mod http;
pub mod models;

pub use errors::AdapterError;
pub use http::{HttpAuthApi, HttpAuthConfig};
pub use models::{Affiliation, AuthResponse, LoginRequest, UserPayload};

use async_trait::async_trait;

/// Authentication endpoints consumed by the session core.
///
/// Implementations are black boxes to the caller: they own transport,
/// headers and payload shaping, and report every failure as an
/// [`AdapterError`].
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for an access token and the actor's profile.
    ///
    /// The profile returned here may carry a smaller permission projection
    /// than [`whoami`](Self::whoami).
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AdapterError>;

    /// Returns the server-verified profile for the bearer `token`.
    ///
    /// This is the single source of truth for permissions.
    async fn whoami(&self, token: &str) -> Result<UserPayload, AdapterError>;

    /// Invalidates the server-side session for `token`.
    async fn logout(&self, token: &str) -> Result<(), AdapterError>;
}
