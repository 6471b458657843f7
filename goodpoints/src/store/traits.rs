//! Session store trait definitions.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// A string key-value store scoped to one client session.
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Get a value by key.
    fn get(&self, key: &str) -> Option<String>;

    /// Set a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value by key.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Extension trait for session stores with typed operations.
pub trait SessionStoreExt: SessionStore {
    /// Get a JSON-deserialized value.
    ///
    /// Unparseable values read as absent.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("ignoring malformed session value under `{key}`: {e}");
                None
            }
        }
    }

    /// Set a JSON-serialized value.
    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_string(value).map_err(Error::Json)?;
        self.set(key, &data)
    }
}

// Blanket implementation
impl<T: SessionStore + ?Sized> SessionStoreExt for T {}
