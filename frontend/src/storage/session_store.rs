//! Scope-aware session persistence.
//!
//! The store reads and writes a [`SessionRecord`] in one of two backends:
//!
//! ```text
//!   durable backend                 ephemeral backend
//!   ┌────────────────────┐          ┌──────────────────┐
//!   │ <marker> = "true"  │          │                  │
//!   │ <token>            │   XOR    │ <token>          │
//!   │ <user>             │          │ <user>           │
//!   └────────────────────┘          └──────────────────┘
//! ```
//!
//! The marker selects which side is authoritative on load. Saving to one side
//! always clears the other, so a session logged out in one scope can never be
//! resurrected from the other.

use super::models::{LoadedSession, SessionRecord, SessionScope};
use super::StorageBackend;
use crate::auth::Identity;
use crate::config::StorageKeys;
use crate::errors::StorageError;
use adapters::UserPayload;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

const MARKER_VALUE: &str = "true";

/// Session persistence over an ephemeral and a durable backend.
#[derive(Debug)]
pub struct SessionStore {
    ephemeral: Arc<dyn StorageBackend>,
    durable: Arc<dyn StorageBackend>,
    keys: StorageKeys,
    migration_checked: AtomicBool,
}

impl SessionStore {
    pub fn new(
        ephemeral: Arc<dyn StorageBackend>,
        durable: Arc<dyn StorageBackend>,
        keys: StorageKeys,
    ) -> Self {
        Self {
            ephemeral,
            durable,
            keys,
            migration_checked: AtomicBool::new(false),
        }
    }

    fn backend(&self, scope: SessionScope) -> &dyn StorageBackend {
        match scope {
            SessionScope::Ephemeral => self.ephemeral.as_ref(),
            SessionScope::Durable => self.durable.as_ref(),
        }
    }

    /// Loads the authoritative session, if any.
    ///
    /// Unreadable or unparsable state is logged and reported as `None`.
    pub fn load(&self) -> Option<LoadedSession> {
        let marked = self.marker_set();
        let scope = SessionScope::from_remember(marked);

        if let Some(record) = self.read_scope(scope) {
            debug!(%scope, "loaded persisted session");
            return Some(LoadedSession { record, scope });
        }

        if !marked && !self.migration_checked.swap(true, Ordering::SeqCst) {
            return self.migrate_legacy();
        }

        None
    }

    /// Persists `record` in `scope` and clears the other scope.
    ///
    /// The target scope and the marker are written first. If one of those
    /// writes fails, the keys are restored to their previous values and the
    /// other scope is not touched, so whatever session loaded before the call
    /// still loads after it.
    pub fn save(&self, record: &SessionRecord, scope: SessionScope) -> Result<(), StorageError> {
        let user = record
            .identity
            .as_ref()
            .map(|identity| serde_json::to_string(&identity.to_payload()))
            .transpose()?;
        let marker = scope.is_durable().then_some(MARKER_VALUE);

        let backend = self.backend(scope);
        let writes: [(&dyn StorageBackend, &str, Option<&str>); 3] = [
            (backend, self.keys.token.as_str(), Some(record.token.as_str())),
            (backend, self.keys.user.as_str(), user.as_deref()),
            (self.durable.as_ref(), self.keys.remember_marker.as_str(), marker),
        ];
        let previous = writes
            .iter()
            .map(|(backend, key, _)| backend.get(key))
            .collect::<Result<Vec<_>, _>>()?;

        for (attempted, (backend, key, value)) in writes.iter().enumerate() {
            if let Err(err) = put(*backend, key, *value) {
                warn!(%scope, key, error = %err, "session write failed, restoring previous values");
                let touched = writes[..=attempted].iter().zip(&previous).rev();
                for ((backend, key, _), value) in touched {
                    if let Err(err) = put(*backend, key, value.as_deref()) {
                        warn!(
                            backend = backend.name(),
                            key,
                            error = %err,
                            "failed to restore session key"
                        );
                    }
                }
                return Err(err);
            }
        }

        // The marker now selects `scope`, so leftovers on the other side are
        // never loaded; they are removed again on the next clear.
        if let Err(err) = self.clear_scope(scope.other()) {
            let other = scope.other();
            warn!(scope = %other, error = %err, "failed to clear the other session scope");
        }

        debug!(%scope, "persisted session");
        Ok(())
    }

    /// Removes the session from both scopes along with the marker.
    ///
    /// Every key is attempted even if an earlier removal fails; the first
    /// error is returned.
    pub fn clear(&self) -> Result<(), StorageError> {
        let results = [
            self.clear_scope(SessionScope::Ephemeral),
            self.clear_scope(SessionScope::Durable),
            self.durable.remove(&self.keys.remember_marker),
        ];
        results.into_iter().collect()
    }

    fn clear_scope(&self, scope: SessionScope) -> Result<(), StorageError> {
        let backend = self.backend(scope);
        let token = backend.remove(&self.keys.token);
        let user = backend.remove(&self.keys.user);
        token.and(user)
    }

    fn marker_set(&self) -> bool {
        match self.durable.get(&self.keys.remember_marker) {
            Ok(value) => value.as_deref() == Some(MARKER_VALUE),
            Err(err) => {
                warn!(error = %err, "durable scope unreadable, ignoring remember marker");
                false
            }
        }
    }

    /// Reads token and user from a single scope.
    fn read_scope(&self, scope: SessionScope) -> Option<SessionRecord> {
        let backend = self.backend(scope);
        let read = |key: &str| match backend.get(key) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(%scope, key, error = %err, "session storage unreadable");
                Err(())
            }
        };

        let token = read(&self.keys.token).ok()??;
        if token.trim().is_empty() {
            warn!(%scope, "discarding empty session token");
            return None;
        }

        let identity = match read(&self.keys.user).ok()? {
            None => None,
            Some(raw) => match serde_json::from_str::<UserPayload>(&raw) {
                Ok(user) => Some(Identity::from(user)),
                Err(err) => {
                    warn!(%scope, error = %err, "persisted user snapshot is corrupt");
                    return None;
                }
            },
        };

        Some(SessionRecord { token, identity })
    }

    /// Adopts a durable session written before the marker existed.
    fn migrate_legacy(&self) -> Option<LoadedSession> {
        let record = self.read_scope(SessionScope::Durable)?;

        info!("adopting unmarked durable session");
        if let Err(err) = self.durable.set(&self.keys.remember_marker, MARKER_VALUE) {
            warn!(error = %err, "failed to write remember marker during migration");
        }
        Some(LoadedSession {
            record,
            scope: SessionScope::Durable,
        })
    }
}

fn put(backend: &dyn StorageBackend, key: &str, value: Option<&str>) -> Result<(), StorageError> {
    match value {
        Some(value) => backend.set(key, value),
        None => backend.remove(key),
    }
}
