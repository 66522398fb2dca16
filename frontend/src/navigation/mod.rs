//! Permission-driven navigation visibility.
//!
//! Unlike the exact-match checks in [`crate::auth::permissions`], menu
//! visibility works on permission families: a feature key such as `tickets`
//! is shown when any `tickets.*` permission is held, plus the explicit
//! cross-family rules in [`features`].

pub mod features;
pub mod filter;

pub use features::{is_feature_visible, FeatureRule, CROSS_FAMILY_RULES};
pub use filter::{visible_entries, NavEntry, NavigationFilter};
