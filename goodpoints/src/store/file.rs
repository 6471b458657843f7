//! File-backed session store.
//!
//! Keeps the whole map in one JSON file so a session can outlive the process
//! that started it.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use super::traits::SessionStore;
use crate::error::{Error, Result};

/// Session store persisted as a JSON object in a single file.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> HashMap<String, String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return HashMap::new(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("session file {} is corrupt, starting empty: {e}", self.path.display());
            HashMap::new()
        })
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::Store(e.to_string()))?;
            }
        }
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content).map_err(|e| Error::Store(e.to_string()))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read_map().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map();
        map.insert(key.to_owned(), value.to_owned());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "goodpoints-session-{}-{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_survives_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        FileSessionStore::new(&path).set("draft", "[1,2]").unwrap();
        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.get("draft"), Some("[1,2]".to_string()));

        reopened.remove("draft").unwrap();
        assert_eq!(FileSessionStore::new(&path).get("draft"), None);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_reads_empty() {
        let path = temp_path("corrupt");
        fs::write(&path, "definitely not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.get("draft"), None);
        store.set("draft", "x").unwrap();
        assert_eq!(store.get("draft"), Some("x".to_string()));

        let _ = fs::remove_file(&path);
    }
}
