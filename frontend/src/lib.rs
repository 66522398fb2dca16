//! Client-side authorization and session core for the service-desk portal.
//!
//! This crate decides, for every route and UI affordance, whether the current
//! actor may see or act on it, and keeps that decision consistent with the
//! server-issued permission set across reloads, duplicated tabs and
//! "remember me" sessions.
//!
//! Data flows leaf-first:
//!
//! ```text
//! storage::SessionStore ──boot──► auth::AuthSessionManager ──snapshot──┬─► auth::RouteGuard
//!                                        │ (whoami / login / logout)    └─► navigation::NavigationFilter
//!                                        ▼
//!                                  adapters::AuthApi
//! ```
//!
//! Rendering, forms and REST payload shaping stay with the host application.

pub mod auth;
pub mod config;
pub mod errors;
pub mod navigation;
pub mod storage;

pub use auth::{
    AuthError, AuthSessionManager, AuthState, GuardDecision, Identity, PermissionSet,
    PermissionVersion, RouteGuard, SessionSnapshot,
};
pub use config::PortalConfig;
pub use navigation::{NavEntry, NavigationFilter};
pub use storage::{SessionScope, SessionStore};
