//! Generic data models for the `adapters` crate.
//!
//! These models define the wire shapes of the authentication endpoints
//! (login request, token response, user profile) so that every `AuthApi`
//! implementation hands the session core the same representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials posted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserPayload,
}

/// A department or subsidiary the actor belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliation {
    #[serde(with = "serde_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// User profile as returned by the login and whoami endpoints.
///
/// Name fields are accepted in camelCase or snake_case and ids as numbers or
/// strings; absent collections decode as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(with = "serde_id")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "first_name")]
    pub first_name: String,
    #[serde(default, alias = "last_name")]
    pub last_name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub departments: Vec<Affiliation>,
    #[serde(default)]
    pub subsidiaries: Vec<Affiliation>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Body of the whoami endpoint: either the bare user or `{ "user": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WhoAmIBody {
    Wrapped { user: UserPayload },
    Bare(UserPayload),
}

impl WhoAmIBody {
    pub(crate) fn into_user(self) -> UserPayload {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

/// Serde helpers for ids that arrive either as JSON numbers or strings.
pub(crate) mod serde_id {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Unsigned(u64),
        Signed(i64),
    }

    pub fn serialize<S>(id: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(id)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(id) => id,
            RawId::Unsigned(id) => id.to_string(),
            RawId::Signed(id) => id.to_string(),
        })
    }
}
