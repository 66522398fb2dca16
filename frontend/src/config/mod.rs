//! Central module for portal-wide session configuration.
//!
//! This module holds the surfaces the guard redirects to, the timing of
//! background identity refreshes, and the key names the session store uses
//! in each persistence scope. Every field has a default, so a partial JSON
//! document (or none at all) is a valid configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for the session core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub routes: RouteConfig,
    pub session: SessionConfig,
    pub storage: StorageKeys,
}

/// Navigation surfaces the core sends the actor to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Login surface used for unauthenticated redirects and after logout.
    pub login: String,
    /// Default landing surface for "redirect on deny" guards.
    pub landing: String,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login: "/login".to_string(),
            landing: "/".to_string(),
        }
    }
}

/// Timing of the session lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between a successful login and the follow-up identity refresh.
    pub refresh_delay_ms: u64,
    /// Upper bound on the best-effort server logout call.
    pub logout_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_delay_ms: 1_000,
            logout_timeout_ms: 5_000,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    #[must_use]
    pub fn logout_timeout(&self) -> Duration {
        Duration::from_millis(self.logout_timeout_ms)
    }
}

/// Key names used inside each persistence scope.
///
/// `token` and `user` are written under the same names in both scopes; the
/// marker only ever lives in the durable scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    pub remember_marker: String,
    pub token: String,
    pub user: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            remember_marker: "rememberMe".to_string(),
            token: "token".to_string(),
            user: "user".to_string(),
        }
    }
}

impl PortalConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, route) in [
            ("routes.login", &self.routes.login),
            ("routes.landing", &self.routes.landing),
        ] {
            if !route.starts_with('/') {
                return Err(ConfigError::invalid(field, "must start with '/'"));
            }
        }

        let keys = &self.storage;
        for (field, key) in [
            ("storage.remember_marker", &keys.remember_marker),
            ("storage.token", &keys.token),
            ("storage.user", &keys.user),
        ] {
            if key.trim().is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
        }
        if keys.token == keys.user
            || keys.token == keys.remember_marker
            || keys.user == keys.remember_marker
        {
            return Err(ConfigError::invalid(
                "storage",
                "marker, token and user keys must be distinct",
            ));
        }

        Ok(())
    }
}
