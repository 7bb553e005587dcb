//! SQLite storage backend with in-memory cache

use std::path::Path;
use std::sync::Mutex;

use dashmap::DashMap;
use rusqlite::Connection;
use rusqlite::OptionalExtension;

use super::StorageBackend;
use crate::error::StorageError;

/// SQLite-backed storage with a DashMap read cache.
///
/// # Example
///
/// ```
/// use gridlist_lib::storage::{SqliteBackend, StorageBackend};
///
/// let backend = SqliteBackend::open_in_memory().unwrap();
/// backend.set_bytes("user:1::movies::per_page", vec![40]).unwrap();
/// assert_eq!(backend.get_bytes("user:1::movies::per_page").unwrap(), Some(vec![40]));
/// ```
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    cache: DashMap<String, Vec<u8>>,
}

impl SqliteBackend {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS list_state (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            cache: DashMap::new(),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(f(&conn)?)
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl StorageBackend for SqliteBackend {
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value.clone()));
        }

        let result = self.with_conn(|conn| {
            conn.query_row("SELECT value FROM list_state WHERE key = ?", [key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()
        })?;

        if let Some(ref value) = result {
            self.cache.insert(key.to_string(), value.clone());
        }

        Ok(result)
    }

    fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO list_state (key, value) VALUES (?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, &value],
            )
        })?;

        self.cache.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| conn.execute("DELETE FROM list_state WHERE key = ?", [key]))?;
        self.cache.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let pattern = format!("{}%", prefix.replace('%', "\\%").replace('_', "\\_"));
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT key FROM list_state WHERE key LIKE ? ESCAPE '\\'")?;
            let rows = stmt.query_map([&pattern], |row| row.get(0))?;
            rows.collect::<Result<Vec<String>, _>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_and_delete() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set_bytes("a::b::visible", vec![1, 2, 3]).unwrap();
        backend.set_bytes("a::b::visible", vec![4]).unwrap();
        assert_eq!(backend.get_bytes("a::b::visible").unwrap(), Some(vec![4]));

        backend.delete("a::b::visible").unwrap();
        assert_eq!(backend.get_bytes("a::b::visible").unwrap(), None);
    }

    #[test]
    fn test_prefix_escapes_wildcards() {
        let backend = SqliteBackend::open_in_memory().unwrap();
        backend.set_bytes("user:1::list_a::order", vec![0]).unwrap();
        backend.set_bytes("user:1::listXa::order", vec![0]).unwrap();

        let keys = backend.keys_with_prefix("user:1::list_a::").unwrap();
        assert_eq!(keys, vec!["user:1::list_a::order"]);
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = std::env::temp_dir().join(format!("gridlist-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("state.db");

        SqliteBackend::open(&path)
            .unwrap()
            .set_bytes("k", vec![9])
            .unwrap();
        let reopened = SqliteBackend::open(&path).unwrap();
        assert_eq!(reopened.get_bytes("k").unwrap(), Some(vec![9]));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
