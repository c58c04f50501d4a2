//! JSON-file-based storage backend.
//!
//! Keeps every key in a single JSON object under a configurable
//! directory (default: `$XDG_DATA_HOME/storefront-rs/`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::KeyValueStorage;
use crate::error::{Result, StorefrontError};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "storefront-rs";
/// File holding all key-value pairs.
const DATA_FILE: &str = "storage.json";
/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// On-disk shape of the data file.
type Entries = BTreeMap<String, String>;

/// File-backed key-value storage.
///
/// # Concurrency
///
/// An in-process [`Mutex`] serializes access within one process. An
/// advisory lock on `storage.lock` ([`std::fs::File::lock`] /
/// [`std::fs::File::lock_shared`]) serializes access across processes:
/// reads take a shared lock, writes an exclusive one.
///
/// # File layout
///
/// ```text
/// <dir>/
///   storage.lock   (cross-process lock sentinel)
///   storage.json   ({"token": "...", "user": "{...}", "cart": "[...]"})
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist and opens
    /// (or creates) the `storage.lock` sentinel.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        tracing::debug!(dir = %dir.display(), "opened file storage");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory.
    ///
    /// On Linux: `$XDG_DATA_HOME/storefront-rs/` (typically
    /// `~/.local/share/storefront-rs/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                StorefrontError::Storage("could not determine platform data directory".into())
            })
    }

    /// Returns the directory this storage writes to.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Acquires the in-process guard and a shared file lock, runs `op`,
    /// then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // The operation's own error is more useful than an unlock failure.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Acquires the in-process guard and an exclusive file lock, runs
    /// `op`, then releases the file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads the data file. A missing file is an empty map.
    fn read_entries(&self) -> Result<Entries> {
        match fs::read_to_string(self.dir.join(DATA_FILE)) {
            Ok(contents) => serde_json::from_str(&contents).map_err(StorefrontError::from),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Atomically writes the data file (write-to-tmp then rename).
    fn write_entries(&self, entries: &Entries) -> Result<()> {
        let path = self.dir.join(DATA_FILE);
        let tmp_path = self.dir.join(format!("{DATA_FILE}.tmp"));
        let json = serde_json::to_string_pretty(entries).map_err(StorefrontError::from)?;
        fs::write(&tmp_path, json).map_err(storage_io_error)?;
        fs::rename(&tmp_path, &path).map_err(storage_io_error)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    #[inline]
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_shared_lock(|| Ok(self.read_entries()?.remove(key)))
    }

    #[inline]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_exclusive_lock(|| {
            let mut entries = self.read_entries()?;
            let _previous = entries.insert(key.to_owned(), value.to_owned());
            self.write_entries(&entries)
        })
    }

    #[inline]
    fn remove(&self, key: &str) -> Result<()> {
        self.with_exclusive_lock(|| {
            let mut entries = self.read_entries()?;
            if entries.remove(key).is_none() {
                return Ok(());
            }
            self.write_entries(&entries)
        })
    }
}

/// Wraps an I/O error into a [`StorefrontError::Storage`].
fn storage_io_error(err: std::io::Error) -> StorefrontError {
    StorefrontError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`StorefrontError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> StorefrontError {
    StorefrontError::Storage(err.to_string().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Creates a [`FileStorage`] in a temporary directory.
    fn temp_storage() -> (FileStorage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        (storage, dir)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (storage, _dir) = temp_storage();
        assert_eq!(storage.get("token").unwrap(), None);
    }

    #[test]
    fn set_then_get() {
        let (storage, _dir) = temp_storage();
        storage.set("token", "abc.def.ghi").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn values_survive_reopening() {
        let (storage, dir) = temp_storage();
        storage.set("user", r#"{"id":"u1"}"#).unwrap();
        drop(storage);

        let reopened = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.get("user").unwrap().as_deref(), Some(r#"{"id":"u1"}"#));
    }

    #[test]
    fn remove_deletes_only_that_key() {
        let (storage, _dir) = temp_storage();
        storage.set("token", "t").unwrap();
        storage.set("cart", "[]").unwrap();
        storage.remove("token").unwrap();
        storage.remove("token").unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
        assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let (storage, dir) = temp_storage();
        storage.set("token", "t").unwrap();
        assert!(dir.path().join(DATA_FILE).exists());
        assert!(!dir.path().join(format!("{DATA_FILE}.tmp")).exists());
    }

    #[test]
    fn corrupt_data_file_is_a_serialization_error() {
        let (storage, dir) = temp_storage();
        fs::write(dir.path().join(DATA_FILE), "not json").unwrap();
        let err = storage.get("token").unwrap_err();
        assert!(matches!(err, StorefrontError::Serialization(_)));
    }

    #[test]
    fn creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(nested.clone()).unwrap();
        assert_eq!(storage.dir(), nested.as_path());
        assert!(nested.join(LOCK_FILE).exists());
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        if let Ok(dir) = FileStorage::default_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }
}
