//! SQLite-backed collection store
//!
//! One `collections` table, created on open. The layout never changes, so
//! there is no schema versioning.

use super::CollectionStore;
use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

const CREATE_COLLECTIONS: &str = "
    CREATE TABLE IF NOT EXISTS collections (
        key         TEXT PRIMARY KEY,
        value       JSON NOT NULL,
        updated_at  DATETIME NOT NULL
    );
";

/// Collection store on a single SQLite connection
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        conn.execute_batch(CREATE_COLLECTIONS)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_COLLECTIONS)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Keys with a saved blob, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT key FROM collections ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl CollectionStore for SqliteStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let value = conn
            .query_row(
                "SELECT value FROM collections WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO collections (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        tracing::debug!(key, bytes = value.len(), "Saved collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.load("knowledgeBase").unwrap(), None);
    }

    #[test]
    fn test_save_replaces_blob() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save("knowledgeBase", "[]").unwrap();
        store.save("knowledgeBase", r#"[{"id":1}]"#).unwrap();
        store.save("documents", "[]").unwrap();

        assert_eq!(
            store.load("knowledgeBase").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
        assert_eq!(store.keys().unwrap(), vec!["documents", "knowledgeBase"]);
    }

    #[test]
    fn test_reopen_keeps_table_and_blobs() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/store.db");

        SqliteStore::open(&path)
            .unwrap()
            .save("documents", "[]")
            .unwrap();

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load("documents").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.keys().unwrap(), vec!["documents"]);
    }
}
