//! Key-value collection storage
//!
//! Collections are stored whole: one JSON blob per fixed key. Callers read
//! the blob, change it in memory and write it back.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// Storage for whole-collection JSON blobs.
pub trait CollectionStore: Send + Sync {
    /// Raw blob under `key`, or `None` if nothing was ever saved.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the blob under `key`.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store, used in tests and for throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryStore::new();
        assert_eq!(store.load("documents").unwrap(), None);
        store.save("documents", "[]").unwrap();
        store.save("documents", "[1]").unwrap();
        assert_eq!(store.load("documents").unwrap().as_deref(), Some("[1]"));
    }
}
