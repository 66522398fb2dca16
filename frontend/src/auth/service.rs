//! Core business logic for the client-side session.
//!
//! [`AuthSessionManager`] owns the authenticated identity for the lifetime of
//! the page. It hydrates from the [`SessionStore`] on boot, verifies the
//! cached identity against the server, logs in and out, and applies
//! background refreshes. All mutable session state lives behind one
//! transition lock and is published to views as a [`SessionSnapshot`] over a
//! `tokio::sync::watch` channel.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──boot──► Loading ──┬─► Authenticated ◄──login──┐
//!                                   └─► Anonymous ─────────────┘
//!                      Authenticated ──logout──► Anonymous
//! ```
//!
//! Refreshes run while `Authenticated` and only flip the snapshot's
//! `refreshing` flag; the current identity stays visible until the verified
//! one replaces it.

use super::errors::AuthError;
use super::models::{AuthState, Identity, PermissionVersion, SessionSnapshot};
use super::permissions;
use super::routes::Navigator;
use crate::config::PortalConfig;
use crate::errors::StorageError;
use crate::storage::{SessionRecord, SessionScope, SessionStore};
use adapters::{AuthApi, LoginRequest};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Result of [`AuthSessionManager::refresh_identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No identity is held, so there was nothing to refresh.
    Skipped,
    /// Identity replaced; the permission set is unchanged.
    Unchanged,
    /// Identity replaced and the permission version bumped to the given value.
    PermissionsChanged(PermissionVersion),
    /// Verification failed; the previous identity is kept.
    Failed,
    /// The session ended, or the manager shut down, before the result arrived.
    Discarded,
}

struct Credentials {
    token: String,
    scope: SessionScope,
}

/// State guarded by the transition lock.
struct Core {
    state: AuthState,
    identity: Option<Arc<Identity>>,
    version: PermissionVersion,
    credentials: Option<Credentials>,
    /// Bumped on login and logout; stale verification results compare unequal.
    epoch: u64,
    refreshes_in_flight: usize,
}

impl Core {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            identity: self.identity.clone(),
            permission_version: self.version,
            refreshing: self.refreshes_in_flight > 0 && self.identity.is_some(),
        }
    }
}

struct Inner {
    api: Arc<dyn AuthApi>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    config: PortalConfig,
    core: Mutex<Core>,
    notify: watch::Sender<SessionSnapshot>,
    alive: AtomicBool,
    pending_refresh: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn publish(&self, core: &Core) {
        self.notify.send_replace(core.snapshot());
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn persist(
        &self,
        token: &str,
        identity: &Identity,
        scope: SessionScope,
    ) -> Result<(), StorageError> {
        self.store
            .save(&SessionRecord::new(token, Some(identity.clone())), scope)
    }

    fn abort_pending_refresh(&self) {
        if let Some(handle) = self.pending_refresh.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.abort_pending_refresh();
    }
}

/// Decrements the in-flight refresh count if a refresh is cancelled mid-call.
struct RefreshGuard<'a> {
    inner: &'a Inner,
    armed: bool,
}

impl RefreshGuard<'_> {
    fn finish(mut self, core: &mut Core) {
        core.refreshes_in_flight = core.refreshes_in_flight.saturating_sub(1);
        self.armed = false;
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut core = self.inner.core.lock();
            core.refreshes_in_flight = core.refreshes_in_flight.saturating_sub(1);
            self.inner.publish(&core);
        }
    }
}

/// Owner of the authenticated identity.
///
/// Cloning yields another handle on the same session.
#[derive(Clone)]
pub struct AuthSessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for AuthSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("AuthSessionManager")
            .field("state", &snapshot.state)
            .field("permission_version", &snapshot.permission_version)
            .field("alive", &self.inner.is_alive())
            .finish()
    }
}

impl AuthSessionManager {
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
        config: PortalConfig,
    ) -> Self {
        let core = Core {
            state: AuthState::Uninitialized,
            identity: None,
            version: PermissionVersion::INITIAL,
            credentials: None,
            epoch: 0,
            refreshes_in_flight: 0,
        };
        let (notify, _) = watch::channel(core.snapshot());
        Self {
            inner: Arc::new(Inner {
                api,
                store,
                navigator,
                config,
                core: Mutex::new(core),
                notify,
                alive: AtomicBool::new(true),
                pending_refresh: Mutex::new(None),
            }),
        }
    }

    /// Hydrates the session from storage and verifies it with the server.
    ///
    /// Only the first call does any work; later calls return the current
    /// state.
    pub async fn boot(&self) -> AuthState {
        let (loaded, epoch) = {
            let mut core = self.inner.core.lock();
            if core.state != AuthState::Uninitialized || !self.inner.is_alive() {
                return core.state;
            }
            core.state = AuthState::Loading;
            self.inner.publish(&core);

            let Some(loaded) = self.inner.store.load() else {
                core.state = AuthState::Anonymous;
                self.inner.publish(&core);
                info!("no persisted session, starting anonymous");
                return core.state;
            };
            core.credentials = Some(Credentials {
                token: loaded.record.token.clone(),
                scope: loaded.scope,
            });
            (loaded, core.epoch)
        };

        let verified = self.inner.api.whoami(&loaded.record.token).await;

        let mut core = self.inner.core.lock();
        if !self.inner.is_alive() || core.epoch != epoch {
            debug!("boot verification finished after the session changed, discarding");
            return core.state;
        }

        match verified {
            Ok(user) => {
                let identity = Identity::from(user);
                if let Err(err) = self
                    .inner
                    .persist(&loaded.record.token, &identity, loaded.scope)
                {
                    warn!(
                        error = %err,
                        scope = %loaded.scope,
                        "failed to persist verified identity"
                    );
                }
                info!(user_id = identity.id(), scope = %loaded.scope, "session verified");
                core.identity = Some(Arc::new(identity));
                core.state = AuthState::Authenticated;
            }
            Err(err) => match loaded.record.identity {
                Some(snapshot) => {
                    warn!(
                        error = %err,
                        user_id = snapshot.id(),
                        "identity verification failed, using persisted snapshot"
                    );
                    core.identity = Some(Arc::new(snapshot));
                    core.state = AuthState::Authenticated;
                }
                None => {
                    warn!(
                        error = %err,
                        "identity verification failed and no snapshot exists, clearing session"
                    );
                    if let Err(err) = self.inner.store.clear() {
                        warn!(error = %err, "failed to clear session storage");
                    }
                    core.credentials = None;
                    core.state = AuthState::Anonymous;
                }
            },
        }

        self.inner.publish(&core);
        core.state
    }

    /// Signs in and persists the session in the scope chosen by `remember`.
    ///
    /// On failure the current session, if any, is left untouched.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<Arc<Identity>, AuthError> {
        if !self.inner.is_alive() {
            return Err(AuthError::ShutDown);
        }

        let request = LoginRequest::new(email, password);
        let response = self.inner.api.login(&request).await.map_err(|err| {
            let err = AuthError::from(err);
            info!(email, error = %err, "login failed");
            err
        })?;

        let identity = Arc::new(Identity::from(response.user));
        let scope = SessionScope::from_remember(remember);
        {
            let mut core = self.inner.core.lock();
            if !self.inner.is_alive() {
                return Err(AuthError::ShutDown);
            }
            self.inner.persist(&response.token, &identity, scope)?;

            core.epoch += 1;
            core.credentials = Some(Credentials {
                token: response.token,
                scope,
            });
            core.identity = Some(identity.clone());
            core.state = AuthState::Authenticated;
            self.inner.publish(&core);
        }

        info!(user_id = identity.id(), %scope, "login succeeded");
        self.schedule_refresh();
        Ok(identity)
    }

    /// Re-verifies the held identity and replaces it wholesale.
    ///
    /// The permission version is bumped only when the permission set changes
    /// as a set. Failures keep the current identity and are logged only.
    pub async fn refresh_identity(&self) -> RefreshOutcome {
        let (token, scope, epoch) = {
            let mut core = self.inner.core.lock();
            if !self.inner.is_alive() || core.identity.is_none() {
                return RefreshOutcome::Skipped;
            }
            let Some(credentials) = core.credentials.as_ref() else {
                return RefreshOutcome::Skipped;
            };
            let started = (credentials.token.clone(), credentials.scope, core.epoch);
            core.refreshes_in_flight += 1;
            self.inner.publish(&core);
            started
        };

        let guard = RefreshGuard {
            inner: &self.inner,
            armed: true,
        };
        let verified = self.inner.api.whoami(&token).await;

        let mut core = self.inner.core.lock();
        guard.finish(&mut core);
        if !self.inner.is_alive() || core.epoch != epoch {
            self.inner.publish(&core);
            debug!("refresh finished after the session changed, discarding");
            return RefreshOutcome::Discarded;
        }

        let outcome = match verified {
            Ok(user) => {
                let identity = Identity::from(user);
                let changed = core
                    .identity
                    .as_deref()
                    .map_or(true, |current| current.permissions() != identity.permissions());
                if let Err(err) = self.inner.persist(&token, &identity, scope) {
                    warn!(error = %err, %scope, "failed to persist refreshed identity");
                }
                core.identity = Some(Arc::new(identity));
                if changed {
                    core.version = core.version.next();
                    info!(version = %core.version, "permission set changed");
                    RefreshOutcome::PermissionsChanged(core.version)
                } else {
                    debug!("identity refreshed, permissions unchanged");
                    RefreshOutcome::Unchanged
                }
            }
            Err(err) => {
                warn!(error = %err, "identity refresh failed, keeping current identity");
                RefreshOutcome::Failed
            }
        };

        self.inner.publish(&core);
        outcome
    }

    /// Ends the session locally, navigates to the login surface, then
    /// invalidates the token on the server, best effort.
    ///
    /// Local state is cleared before the server call, so a login completing
    /// while the call is pending is not undone by it.
    pub async fn logout(&self) {
        if !self.inner.is_alive() {
            debug!("logout requested after shutdown, ignoring");
            return;
        }

        self.inner.abort_pending_refresh();
        let token = {
            let mut core = self.inner.core.lock();
            let token = core.credentials.take().map(|credentials| credentials.token);
            core.epoch += 1;
            core.identity = None;
            core.version = PermissionVersion::INITIAL;
            core.state = AuthState::Anonymous;
            if let Err(err) = self.inner.store.clear() {
                warn!(error = %err, "failed to clear session storage on logout");
            }
            self.inner.publish(&core);
            token
        };

        info!("logged out");
        self.inner.navigator.navigate(&self.inner.config.routes.login);

        if let Some(token) = token {
            let timeout = self.inner.config.session.logout_timeout();
            match tokio::time::timeout(timeout, self.inner.api.logout(&token)).await {
                Ok(Ok(())) => debug!("server session invalidated"),
                Ok(Err(err)) => debug!(error = %err, "server logout failed, ignoring"),
                Err(_) => debug!(?timeout, "server logout timed out, ignoring"),
            }
        }
    }

    /// Tears the manager down: pending work is aborted and no in-flight call
    /// may change state afterwards.
    pub fn shutdown(&self) {
        if self.inner.alive.swap(false, Ordering::SeqCst) {
            self.inner.abort_pending_refresh();
            debug!("session manager shut down");
        }
    }

    fn schedule_refresh(&self) {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.config.session.refresh_delay();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                let outcome = AuthSessionManager { inner }.refresh_identity().await;
                debug!(?outcome, "post-login refresh finished");
            }
        });
        if let Some(previous) = self.inner.pending_refresh.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.notify.borrow().clone()
    }

    /// Receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.notify.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.inner.notify.borrow().state
    }

    pub fn identity(&self) -> Option<Arc<Identity>> {
        self.inner.notify.borrow().identity.clone()
    }

    pub fn permission_version(&self) -> PermissionVersion {
        self.inner.notify.borrow().permission_version
    }

    pub fn has_permission(&self, required: &str) -> bool {
        permissions::has_permission(self.inner.notify.borrow().permissions(), required)
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, required: &[S]) -> bool {
        permissions::has_any_permission(self.inner.notify.borrow().permissions(), required)
    }

    pub fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }
}
