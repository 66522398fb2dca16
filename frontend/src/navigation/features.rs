//! Feature-key visibility rules.

use crate::auth::PermissionSet;

/// Visibility rule for a feature key that reaches beyond its own family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRule {
    pub feature: &'static str,
    /// Permission prefixes, each including the trailing dot.
    pub families: &'static [&'static str],
    /// Individual permissions from unrelated families.
    pub permissions: &'static [&'static str],
}

impl FeatureRule {
    fn matches(&self, granted: &PermissionSet) -> bool {
        self.families.iter().any(|family| granted.has_prefix(family))
            || self.permissions.iter().any(|p| granted.contains(p))
    }
}

/// Features whose visibility is not just their own `<feature>.` family.
///
/// This list is matched literally. Features absent from it fall back to the
/// plain family rule; nothing here is inferred.
pub const CROSS_FAMILY_RULES: &[FeatureRule] = &[
    FeatureRule {
        feature: "dashboard",
        families: &["dashboard.", "reports."],
        permissions: &[],
    },
    FeatureRule {
        feature: "delays",
        families: &["delays."],
        permissions: &["timesheet.justify_delay"],
    },
];

/// Returns the cross-family rule for `feature`, if one is defined.
#[must_use]
pub fn rule_for(feature: &str) -> Option<&'static FeatureRule> {
    CROSS_FAMILY_RULES.iter().find(|rule| rule.feature == feature)
}

/// Returns `true` if the actor holding `granted` may see `feature`.
///
/// Nothing is visible without an identity.
#[must_use]
pub fn is_feature_visible(feature: &str, granted: Option<&PermissionSet>) -> bool {
    let Some(granted) = granted else {
        return false;
    };
    match rule_for(feature) {
        Some(rule) => rule.matches(granted),
        None => granted.has_prefix(&format!("{feature}.")),
    }
}
