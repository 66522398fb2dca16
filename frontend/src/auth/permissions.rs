//! Exact-match permission checks.
//!
//! These are pure functions over the held permission set, cheap enough to
//! call on every render. Prefix and family inference is deliberately absent
//! here; it belongs to the navigation filter.

use super::models::PermissionSet;

/// Returns `true` if `required` is granted.
///
/// Without an identity (`granted == None`) nothing is granted. An empty
/// `required` string requests no restriction and is always granted to an
/// identity.
#[must_use]
pub fn has_permission(granted: Option<&PermissionSet>, required: &str) -> bool {
    let Some(granted) = granted else {
        return false;
    };
    required.is_empty() || granted.contains(required)
}

/// Returns `true` if at least one of `required` is granted (logical OR).
///
/// An empty list yields `false`. Callers that want "empty list means no
/// requirement" normalize that themselves, as the route guard does.
#[must_use]
pub fn has_any_permission<S: AsRef<str>>(granted: Option<&PermissionSet>, required: &[S]) -> bool {
    let Some(granted) = granted else {
        return false;
    };
    required.iter().any(|r| granted.contains(r.as_ref()))
}
