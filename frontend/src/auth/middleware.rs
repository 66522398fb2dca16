//! Route protection for authenticated surfaces.
//!
//! A [`RouteGuard`] turns the current [`SessionSnapshot`] into a
//! [`GuardDecision`] for one route: wait, render, redirect, or show the
//! configured denial. [`GuardWatch`] re-runs that decision whenever the
//! session's state or permission version moves, so a permission change
//! reaches mounted routes without a reload.

use super::models::{AuthState, PermissionSet, PermissionVersion, SessionSnapshot};
use super::permissions::has_any_permission;
use crate::config::RouteConfig;
use tokio::sync::watch;

/// Permissions a route asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PermissionRequirement {
    /// Authentication alone is enough.
    #[default]
    None,
    /// At least one of these permissions.
    AnyOf(Vec<String>),
}

impl PermissionRequirement {
    /// Builds an `AnyOf` requirement; an empty list means no requirement.
    pub fn any_of<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let permissions: Vec<String> = permissions.into_iter().map(Into::into).collect();
        if permissions.is_empty() {
            Self::None
        } else {
            Self::AnyOf(permissions)
        }
    }

    pub fn single(permission: impl Into<String>) -> Self {
        Self::AnyOf(vec![permission.into()])
    }

    /// Whether an authenticated actor holding `granted` satisfies this.
    #[must_use]
    pub fn is_satisfied_by(&self, granted: &PermissionSet) -> bool {
        match self {
            Self::None => true,
            Self::AnyOf(permissions) => has_any_permission(Some(granted), permissions.as_slice()),
        }
    }
}

/// What a guarded route shows to an authenticated actor lacking permission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeniedBehavior<T> {
    /// Render the access-denied panel in place.
    #[default]
    AccessDenied,
    /// Send the actor to the landing surface.
    RedirectToLanding,
    /// Render caller-supplied content.
    Fallback(T),
}

/// Outcome of evaluating a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision<T> {
    /// Boot has not finished; render a loading state.
    Pending,
    /// Render the protected content.
    Render,
    /// Navigate away without mounting the protected content.
    Redirect {
        to: String,
        /// Route to come back to after signing in.
        return_to: Option<String>,
    },
    /// Render the access-denied panel.
    AccessDenied,
    /// Render the caller's fallback.
    Fallback(T),
}

impl<T> GuardDecision<T> {
    #[must_use]
    pub fn renders_content(&self) -> bool {
        matches!(self, Self::Render)
    }

    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect { to, .. } => Some(to.as_str()),
            _ => None,
        }
    }
}

/// Per-route access policy.
#[derive(Debug, Clone)]
pub struct RouteGuard<T = ()> {
    requirement: PermissionRequirement,
    on_denied: DeniedBehavior<T>,
    path: Option<String>,
    login_route: String,
    landing_route: String,
}

impl RouteGuard<()> {
    /// Guard that only requires authentication and shows the access-denied
    /// panel on denial.
    pub fn new(routes: &RouteConfig) -> Self {
        Self {
            requirement: PermissionRequirement::None,
            on_denied: DeniedBehavior::AccessDenied,
            path: None,
            login_route: routes.login.clone(),
            landing_route: routes.landing.clone(),
        }
    }
}

impl<T> RouteGuard<T> {
    #[must_use]
    pub fn require(mut self, requirement: PermissionRequirement) -> Self {
        self.requirement = requirement;
        self
    }

    /// Requires any one of `permissions`; an empty list requires nothing.
    #[must_use]
    pub fn require_any<I, S>(self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require(PermissionRequirement::any_of(permissions))
    }

    /// Path of the guarded route, carried on login redirects.
    #[must_use]
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn redirect_on_denied(mut self) -> Self {
        self.on_denied = DeniedBehavior::RedirectToLanding;
        self
    }

    /// Renders `fallback` on denial instead of the access-denied panel.
    #[must_use]
    pub fn with_fallback<U>(self, fallback: U) -> RouteGuard<U> {
        RouteGuard {
            requirement: self.requirement,
            on_denied: DeniedBehavior::Fallback(fallback),
            path: self.path,
            login_route: self.login_route,
            landing_route: self.landing_route,
        }
    }

    pub fn requirement(&self) -> &PermissionRequirement {
        &self.requirement
    }
}

impl<T: Clone> RouteGuard<T> {
    pub fn evaluate(&self, snapshot: &SessionSnapshot) -> GuardDecision<T> {
        match snapshot.state {
            AuthState::Uninitialized | AuthState::Loading => GuardDecision::Pending,
            AuthState::Anonymous => self.login_redirect(),
            AuthState::Authenticated => match snapshot.permissions() {
                None => self.login_redirect(),
                Some(granted) if self.requirement.is_satisfied_by(granted) => {
                    GuardDecision::Render
                }
                Some(_) => self.denied(),
            },
        }
    }

    /// Ties this guard to a session subscription.
    pub fn watch(self, session: watch::Receiver<SessionSnapshot>) -> GuardWatch<T> {
        GuardWatch {
            guard: self,
            session,
            last: None,
        }
    }

    fn login_redirect(&self) -> GuardDecision<T> {
        GuardDecision::Redirect {
            to: self.login_route.clone(),
            return_to: self
                .path
                .clone()
                .filter(|path| *path != self.login_route),
        }
    }

    fn denied(&self) -> GuardDecision<T> {
        match &self.on_denied {
            DeniedBehavior::AccessDenied => GuardDecision::AccessDenied,
            DeniedBehavior::RedirectToLanding => GuardDecision::Redirect {
                to: self.landing_route.clone(),
                return_to: None,
            },
            DeniedBehavior::Fallback(fallback) => GuardDecision::Fallback(fallback.clone()),
        }
    }
}

type DecisionInputs = (AuthState, PermissionVersion, Option<PermissionSet>);

fn decision_inputs(snapshot: &SessionSnapshot) -> DecisionInputs {
    (
        snapshot.state,
        snapshot.permission_version,
        snapshot.permissions().cloned(),
    )
}

/// A guard bound to a live session.
#[derive(Debug)]
pub struct GuardWatch<T> {
    guard: RouteGuard<T>,
    session: watch::Receiver<SessionSnapshot>,
    last: Option<DecisionInputs>,
}

impl<T: Clone> GuardWatch<T> {
    /// Evaluates against the latest snapshot.
    pub fn current(&mut self) -> GuardDecision<T> {
        let snapshot = self.session.borrow_and_update().clone();
        self.last = Some(decision_inputs(&snapshot));
        self.guard.evaluate(&snapshot)
    }

    /// Waits until auth state, permission version or the held permission set
    /// changes, then returns the new decision.
    ///
    /// Returns `None` once the session manager is gone.
    pub async fn changed(&mut self) -> Option<GuardDecision<T>> {
        loop {
            self.session.changed().await.ok()?;
            let snapshot = self.session.borrow_and_update().clone();
            let inputs = decision_inputs(&snapshot);
            if self.last.as_ref() != Some(&inputs) {
                self.last = Some(inputs);
                return Some(self.guard.evaluate(&snapshot));
            }
        }
    }
}
