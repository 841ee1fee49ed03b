//! Key/value persistence backends for the image store and config.
//!
//! The browser build keeps everything in `localStorage`; the native build
//! writes one JSON file per namespace key; tests use an in-memory map.

use std::collections::HashMap;

use crate::error::StorageError;

/// Minimal string key/value store, shaped after `window.localStorage`.
pub trait Storage {
    /// Read a record. `Ok(None)` when it was never written.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write (replace) a record.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a record; deleting a missing record is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage. Lives as long as the value does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a record, as if a previous session had written it.
    pub fn with_item(mut self, key: &str, value: &str) -> Self {
        self.items.insert(key.to_string(), value.to_string());
        self
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Directory-backed storage: each key is a `<key>.json` file.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStorage {
    /// Directory name under the platform data directory.
    const APP_DIR: &'static str = "rawteous-docs";

    /// Storage rooted at an explicit directory (created on first write).
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the user's data directory (XDG data dir on Linux),
    /// falling back to `~/.local/share`.
    pub fn default_location() -> Result<Self, StorageError> {
        let base = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .ok_or_else(|| {
                StorageError::Unavailable("Could not determine data directory".to_string())
            })?;
        Ok(Self::new(base.join(Self::APP_DIR)))
    }

    /// Root directory of this storage.
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> std::path::PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No stored record at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        std::fs::write(&path, value)?;
        log::trace!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// `window.localStorage` (WASM only).
#[cfg(target_arch = "wasm32")]
pub struct LocalStorage {
    inner: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// Open the origin's local storage.
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object available".to_string()))?;
        let inner = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("localStorage access error: {:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage not available".to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("localStorage read error: {:?}", e)))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner
            .set_item(key, value)
            .map_err(|e| StorageError::WriteRejected(format!("{:?}", e)))
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner
            .remove_item(key)
            .map_err(|e| StorageError::WriteRejected(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").unwrap(), None);
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));
        assert_eq!(storage.get_item("rawteous_images").unwrap(), None);

        storage.set_item("rawteous_images", "{}").unwrap();
        assert_eq!(
            storage.get_item("rawteous_images").unwrap().as_deref(),
            Some("{}")
        );
        assert!(dir.path().join("nested/rawteous_images.json").exists());

        storage.remove_item("rawteous_images").unwrap();
        storage.remove_item("rawteous_images").unwrap();
        assert_eq!(storage.get_item("rawteous_images").unwrap(), None);
    }

    #[test]
    fn test_file_storage_sanitizes_key() {
        let storage = FileStorage::new("/tmp/x");
        assert_eq!(
            storage.path_for("a/b c"),
            std::path::PathBuf::from("/tmp/x/a_b_c.json")
        );
    }
}
