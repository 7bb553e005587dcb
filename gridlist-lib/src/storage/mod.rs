//! Preference and session storage
//!
//! Raw byte backends are wrapped by [`ScopedStore`], which serializes typed
//! values with bincode and prefixes every key with its scope and widget:
//! `{scope}::{widget}::{key}`.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// Preference holding the visible column names.
pub const PREF_VISIBLE: &str = "visible";
/// Preference holding the column order.
pub const PREF_ORDER: &str = "order";
/// Preference holding the page size.
pub const PREF_PER_PAGE: &str = "per_page";
/// Preference holding the sort column and direction.
pub const PREF_SORT: &str = "sort";
/// Session slot holding the last visited page.
pub const SESSION_LAST_PAGE: &str = "lastVisitedPage";

/// Raw byte storage.
pub trait StorageBackend: Send + Sync {
    /// Get raw bytes for a key.
    fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Set raw bytes for a key.
    fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Delete a key.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Get all keys matching a prefix.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Typed key-value access confined to one scope and widget.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use gridlist_lib::storage::{MemoryBackend, ScopedStore};
///
/// let store = ScopedStore::new(Arc::new(MemoryBackend::new()), "user:7", "movies-list");
/// store.put("per_page", &40usize).unwrap();
/// assert_eq!(store.get_or("per_page", 20usize).unwrap(), 40);
/// ```
#[derive(Clone)]
pub struct ScopedStore {
    backend: Arc<dyn StorageBackend>,
    prefix: String,
}

impl ScopedStore {
    /// Creates a store for `scope` and `widget` over a shared backend.
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        scope: impl AsRef<str>,
        widget: impl AsRef<str>,
    ) -> Self {
        Self {
            backend,
            prefix: format!("{}::{}::", scope.as_ref(), widget.as_ref()),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Get a typed value for a key.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.get_bytes(&self.key(key))? {
            Some(bytes) => Ok(Some(
                bincode::deserialize(&bytes).map_err(StorageError::Deserialization)?,
            )),
            None => Ok(None),
        }
    }

    /// Get a typed value for a key, returning a default if not found.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StorageError> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Set a typed value for a key.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let bytes = bincode::serialize(value).map_err(StorageError::Serialization)?;
        debug!("Storing '{}{}' ({} bytes)", self.prefix, key, bytes.len());
        self.backend.set_bytes(&self.key(key), bytes)
    }

    /// Delete a key.
    pub fn reset(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(&self.key(key))
    }

    /// Keys stored in this scope, without the prefix.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        let keys = self.backend.keys_with_prefix(&self.prefix)?;
        Ok(keys
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.prefix).map(str::to_string))
            .collect())
    }
}

impl std::fmt::Debug for ScopedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Per-user list preferences.
#[derive(Debug, Clone)]
pub struct PreferenceStore(ScopedStore);

impl PreferenceStore {
    /// Preferences of `user` for the list `widget`.
    pub fn new(backend: Arc<dyn StorageBackend>, user: &str, widget: &str) -> Self {
        Self(ScopedStore::new(backend, format!("user:{user}"), widget))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.0.get(key)
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StorageError> {
        self.0.get_or(key, default)
    }

    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.0.put(key, value)
    }

    pub fn reset(&self, key: &str) -> Result<(), StorageError> {
        self.0.reset(key)
    }
}

/// Per-session list state.
#[derive(Debug, Clone)]
pub struct SessionStore(ScopedStore);

impl SessionStore {
    /// State of `session` for the list `widget`.
    pub fn new(backend: Arc<dyn StorageBackend>, session: &str, widget: &str) -> Self {
        Self(ScopedStore::new(backend, format!("session:{session}"), widget))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.0.get(key)
    }

    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.0.put(key, value)
    }
}
