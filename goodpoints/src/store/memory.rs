//! In-memory session store.

use std::{collections::HashMap, sync::RwLock};

use super::traits::SessionStore;
use crate::error::Result;

/// Session store held in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    data: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        data.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        data.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let store = MemorySessionStore::new();

        store.set("key1", "value1").unwrap();
        assert_eq!(store.get("key1"), Some("value1".to_string()));

        store.remove("key1").unwrap();
        assert_eq!(store.get("key1"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_overwrite() {
        let store = MemorySessionStore::new();

        store.set("key", "a").unwrap();
        store.set("key", "b").unwrap();
        assert_eq!(store.get("key"), Some("b".to_string()));
        assert_eq!(store.len(), 1);
    }
}
