//! Visible navigation tree.

use super::features::is_feature_visible;
use crate::auth::{PermissionSet, PermissionVersion, SessionSnapshot};
use crate::errors::ConfigError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// A node of the static menu definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavEntry {
    pub key: String,
    pub label: String,
    /// Route of the entry; `None` for pure groups.
    #[serde(default)]
    pub path: Option<String>,
    /// Feature key gating the entry and its subtree.
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavEntry>,
}

impl NavEntry {
    pub fn link(key: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            path: Some(path.into()),
            feature: None,
            children: Vec::new(),
        }
    }

    pub fn group(
        key: impl Into<String>,
        label: impl Into<String>,
        children: Vec<NavEntry>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            path: None,
            feature: None,
            children,
        }
    }

    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// Finds an entry by key anywhere in this subtree.
    pub fn find(&self, key: &str) -> Option<&NavEntry> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(key))
    }
}

/// Returns the part of `tree` the actor holding `granted` may see.
///
/// A hidden entry hides its subtree, and a group without a path of its own
/// is dropped once all of its children are hidden.
pub fn visible_entries(tree: &[NavEntry], granted: Option<&PermissionSet>) -> Vec<NavEntry> {
    tree.iter()
        .filter_map(|entry| visible_entry(entry, granted))
        .collect()
}

fn visible_entry(entry: &NavEntry, granted: Option<&PermissionSet>) -> Option<NavEntry> {
    if let Some(feature) = entry.feature.as_deref().filter(|f| !f.is_empty()) {
        if !is_feature_visible(feature, granted) {
            return None;
        }
    }

    let children = visible_entries(&entry.children, granted);
    if entry.path.is_none() && !entry.children.is_empty() && children.is_empty() {
        return None;
    }

    Some(NavEntry {
        key: entry.key.clone(),
        label: entry.label.clone(),
        path: entry.path.clone(),
        feature: entry.feature.clone(),
        children,
    })
}

#[derive(PartialEq, Eq)]
struct MemoKey {
    granted: Option<Vec<String>>,
    version: PermissionVersion,
}

/// Owns the menu tree and memoizes its filtered form.
///
/// The memo key is the sorted granted list together with the permission
/// version, so unrelated re-renders reuse the previous result.
#[derive(Default)]
pub struct NavigationFilter {
    tree: Vec<NavEntry>,
    memo: Mutex<Option<(MemoKey, Arc<[NavEntry]>)>>,
    recomputations: AtomicU64,
}

impl std::fmt::Debug for NavigationFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationFilter")
            .field("entries", &self.tree.len())
            .field("recomputations", &self.recomputations())
            .finish()
    }
}

impl NavigationFilter {
    pub fn new(tree: Vec<NavEntry>) -> Self {
        Self {
            tree,
            memo: Mutex::new(None),
            recomputations: AtomicU64::new(0),
        }
    }

    /// Builds a filter from a JSON array of entries.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn tree(&self) -> &[NavEntry] {
        &self.tree
    }

    /// Visible tree for `granted` at `version`, reusing the last result when
    /// both are unchanged.
    pub fn visible(
        &self,
        granted: Option<&PermissionSet>,
        version: PermissionVersion,
    ) -> Arc<[NavEntry]> {
        let key = MemoKey {
            granted: granted.map(PermissionSet::sorted),
            version,
        };

        let mut memo = self.memo.lock();
        if let Some((cached_key, entries)) = memo.as_ref() {
            if *cached_key == key {
                return Arc::clone(entries);
            }
        }

        let entries: Arc<[NavEntry]> = visible_entries(&self.tree, granted).into();
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        trace!(%version, visible = entries.len(), "navigation recomputed");
        *memo = Some((key, Arc::clone(&entries)));
        entries
    }

    /// Visible tree for the actor in `snapshot`.
    pub fn visible_for(&self, snapshot: &SessionSnapshot) -> Arc<[NavEntry]> {
        self.visible(snapshot.permissions(), snapshot.permission_version)
    }

    /// Number of times the tree was actually filtered.
    pub fn recomputations(&self) -> u64 {
        self.recomputations.load(Ordering::Relaxed)
    }
}
