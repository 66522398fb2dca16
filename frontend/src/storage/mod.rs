//! Session persistence across the two storage scopes.
//!
//! A [`StorageBackend`] is a flat string key/value area, the shape of browser
//! web storage. The [`SessionStore`] puts two of them side by side, one
//! ephemeral (tab lifetime) and one durable (until logout), and guarantees
//! that at most one of them holds a live session.

pub mod backends;
pub mod models;
pub mod session_store;

pub use backends::{JsonFileStorage, MemoryStorage};
pub use models::{LoadedSession, SessionRecord, SessionScope};
pub use session_store::SessionStore;

use crate::errors::StorageError;
use std::fmt::Debug;

/// A flat string key/value persistence area.
pub trait StorageBackend: Send + Sync + Debug {
    /// Short name used in logs, e.g. `"ephemeral"`.
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
