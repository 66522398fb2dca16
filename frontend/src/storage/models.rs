//! Persisted session shapes.

use crate::auth::Identity;
use std::fmt;

/// Which persistence scope holds a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionScope {
    /// Lives as long as the tab.
    Ephemeral,
    /// Lives until explicit logout.
    Durable,
}

impl SessionScope {
    /// Maps the "remember me" flag chosen at login.
    #[must_use]
    pub fn from_remember(remember: bool) -> Self {
        if remember {
            Self::Durable
        } else {
            Self::Ephemeral
        }
    }

    #[must_use]
    pub fn is_durable(self) -> bool {
        self == Self::Durable
    }

    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Ephemeral => Self::Durable,
            Self::Durable => Self::Ephemeral,
        }
    }
}

impl fmt::Display for SessionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ephemeral => f.write_str("ephemeral"),
            Self::Durable => f.write_str("durable"),
        }
    }
}

/// Access token plus the last known identity.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub identity: Option<Identity>,
}

impl SessionRecord {
    pub fn new(token: impl Into<String>, identity: Option<Identity>) -> Self {
        Self {
            token: token.into(),
            identity,
        }
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("token", &"<redacted>")
            .field("identity", &self.identity)
            .finish()
    }
}

/// A record together with the scope it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSession {
    pub record: SessionRecord,
    pub scope: SessionScope,
}
