//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe map implementing
//! [`KeyValueStorage`]. Useful wherever file I/O is undesirable.

use std::collections::HashMap;
use std::sync::Mutex;

use super::KeyValueStorage;
use crate::error::{Result, StorefrontError};

/// Thread-safe in-memory key-value storage.
///
/// # Example
///
/// ```rust
/// use storefront_rs::storage::{InMemoryStorage, KeyValueStorage};
///
/// let storage = InMemoryStorage::new();
/// storage.set("token", "abc").unwrap();
/// assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc"));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// All entries behind a single mutex.
    inner: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn len(&self) -> Result<usize> {
        self.with_lock(|map| map.len())
    }

    /// Returns `true` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn is_empty(&self) -> Result<bool> {
        self.with_lock(|map| map.is_empty())
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R, F: FnOnce(&mut HashMap<String, String>) -> R>(&self, f: F) -> Result<R> {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        Ok(f(&mut inner))
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> StorefrontError {
    StorefrontError::Storage(err.to_string().into())
}

impl KeyValueStorage for InMemoryStorage {
    #[inline]
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_lock(|map| map.get(key).cloned())
    }

    #[inline]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_lock(|map| {
            let _previous = map.insert(key.to_owned(), value.to_owned());
        })
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<()> {
        self.with_lock(|map| {
            let _previous = map.remove(key);
        })
    }
}
