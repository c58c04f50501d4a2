//! Pluggable durable client storage.
//!
//! The session and cart stores mirror their state into a small
//! string-keyed store that survives restarts. [`KeyValueStorage`] is the
//! seam; [`InMemoryStorage`] backs tests and [`FileStorage`] backs the
//! CLI.

use std::sync::Arc;

use crate::error::Result;

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

/// Key holding the raw credential token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the serialized user record.
pub const USER_KEY: &str = "user";
/// Key holding the serialized cart entries.
pub const CART_KEY: &str = "cart";

/// String key-value store used as durable client storage.
///
/// All methods take `&self`; implementations use interior mutability
/// (e.g. `Mutex`) so one backend can be shared between stores.
pub trait KeyValueStorage: core::fmt::Debug + Send + Sync {
    /// Returns the value stored under `key`, or `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    #[inline]
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    #[inline]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
