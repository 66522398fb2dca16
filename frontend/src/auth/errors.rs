//! Custom error types specific to authentication failures.
//!
//! Only login reports errors to its caller. Verification and refresh failures
//! are recovered inside the session manager and never reach the user, and a
//! permission denial is a guard decision, not an error.

use crate::errors::StorageError;
use adapters::AdapterError;
use thiserror::Error;

/// Normalized login failure.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials or token refused by the server.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// The server could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered, but not with something usable.
    #[error("server error: {0}")]
    Server(String),

    /// The session could not be persisted.
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),

    /// The session manager was shut down.
    #[error("session manager has been shut down")]
    ShutDown,
}

impl AuthError {
    /// Message suitable for inline display on the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication { message } if !message.trim().is_empty() => message.clone(),
            Self::Authentication { .. } => "Invalid email or password.".to_string(),
            Self::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            Self::Server(_) | Self::Storage(_) | Self::ShutDown => {
                "Sign-in is currently unavailable. Please try again later.".to_string()
            }
        }
    }

    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}

impl From<AdapterError> for AuthError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Unauthorized(message) => Self::Authentication { message },
            // Login validation failures come back as 400/422 with a usable message.
            AdapterError::Rejected { status, message } if (400..500).contains(&status) => {
                Self::Authentication { message }
            }
            AdapterError::Rejected { status, message } => {
                Self::Server(format!("status {status}: {message}"))
            }
            AdapterError::Transport(message) => Self::Network(message),
            AdapterError::Decode(message) => Self::Server(message),
        }
    }
}
