//! Custom error types specific to the `adapters` crate.
//!
//! This module defines errors that can occur while talking to the
//! authentication endpoints: transport failures, rejected requests and
//! responses that cannot be decoded.

use thiserror::Error;

/// Errors surfaced by an [`AuthApi`](crate::AuthApi) implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdapterError {
    /// Credentials or token were refused (HTTP 401/403).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The server answered with any other non-success status.
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl AdapterError {
    /// Returns `true` when the server refused the credentials or token.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Returns the server- or transport-provided message without the
    /// variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized(message)
            | Self::Transport(message)
            | Self::Decode(message)
            | Self::Rejected { message, .. } => message,
        }
    }

    /// Maps a non-success HTTP status and its extracted message to an error.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Unauthorized(message),
            _ => Self::Rejected { status, message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_unauthorized() {
        assert!(AdapterError::from_status(401, "bad credentials").is_auth_failure());
        assert!(AdapterError::from_status(403, "forbidden").is_auth_failure());
    }

    #[test]
    fn other_statuses_are_rejections() {
        let err = AdapterError::from_status(503, "maintenance");
        assert_eq!(
            err,
            AdapterError::Rejected {
                status: 503,
                message: "maintenance".to_string()
            }
        );
        assert!(!err.is_auth_failure());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn message_strips_prefix() {
        let err = AdapterError::Unauthorized("Invalid email or password".into());
        assert_eq!(err.message(), "Invalid email or password");
        assert!(err.to_string().starts_with("unauthorized"));
    }
}
