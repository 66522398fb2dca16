//! Data structures for authentication-related entities.
//!
//! This module defines the authenticated actor ([`Identity`]), its
//! server-issued [`PermissionSet`], the [`PermissionVersion`] logical clock,
//! and the [`SessionSnapshot`] the session manager publishes to views.

use adapters::{Affiliation, UserPayload};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Set of `"<resource>.<action>"` permission strings.
///
/// Ordering and duplicates in the server payload are irrelevant: two sets
/// compare equal iff they hold the same strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact membership test.
    #[must_use]
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    /// Returns `true` if any permission starts with `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.iter().any(|permission| permission.starts_with(prefix))
    }

    /// Permissions in ascending order.
    #[must_use]
    pub fn sorted(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Logical clock bumped whenever a refresh changes the permission set.
///
/// Only equality is meaningful to consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PermissionVersion(u64);

impl PermissionVersion {
    pub const INITIAL: Self = Self(0);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PermissionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// The authenticated actor.
///
/// Built only from a server payload (or a persisted copy of one) and never
/// mutated afterwards; a refresh produces a new `Identity`. The role label is
/// carried for display and plays no part in access checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: String,
    email: String,
    first_name: String,
    last_name: String,
    role: Option<String>,
    departments: Vec<Affiliation>,
    subsidiaries: Vec<Affiliation>,
    permissions: PermissionSet,
}

impl Identity {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// "First Last", falling back to the email when both names are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn departments(&self) -> &[Affiliation] {
        &self.departments
    }

    pub fn subsidiaries(&self) -> &[Affiliation] {
        &self.subsidiaries
    }

    pub fn belongs_to_department(&self, department_id: &str) -> bool {
        self.departments.iter().any(|d| d.id == department_id)
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Wire form used when persisting a snapshot.
    pub fn to_payload(&self) -> UserPayload {
        UserPayload {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role.clone(),
            departments: self.departments.clone(),
            subsidiaries: self.subsidiaries.clone(),
            permissions: self.permissions.sorted(),
        }
    }
}

impl From<UserPayload> for Identity {
    fn from(user: UserPayload) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            departments: user.departments,
            subsidiaries: user.subsidiaries,
            permissions: user.permissions.into_iter().collect(),
        }
    }
}

/// Lifecycle state of the session manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AuthState {
    #[default]
    Uninitialized,
    Loading,
    Authenticated,
    Anonymous,
}

impl AuthState {
    /// Returns `true` once boot has produced a definite answer.
    #[must_use]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Authenticated | Self::Anonymous)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Authenticated => "authenticated",
            Self::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of the session published to subscribers.
///
/// Never carries the access token.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub state: AuthState,
    pub identity: Option<Arc<Identity>>,
    pub permission_version: PermissionVersion,
    /// A background verification is in flight; `identity` may be stale.
    pub refreshing: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated && self.identity.is_some()
    }

    /// Permission set of the held identity, if any.
    #[must_use]
    pub fn permissions(&self) -> Option<&PermissionSet> {
        self.identity.as_deref().map(Identity::permissions)
    }
}
