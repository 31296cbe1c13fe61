//! Key/value persistence
//!
//! A tiny LocalStorage-shaped interface. Backends:
//! - `MemoryStore`: process-local map (tests, headless runs)
//! - `FileStore`: one file per key in a directory (native)
//! - `LocalStore`: browser LocalStorage (wasm32)
//!
//! Readers treat a missing or unreadable value as absent.

use std::collections::HashMap;

use crate::error::StoreError;

/// String key/value storage
pub trait Store {
    /// Read a value. Any backend failure reads as `None`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value, replacing whatever was stored under `key`.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value if present.
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Store for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::path::PathBuf;

    use super::Store;
    use crate::error::StoreError;

    /// Directory-backed store: each key is a `<key>.json` file.
    ///
    /// Writes go to a temporary file first and are renamed into place, so a
    /// crash mid-write leaves the previous value intact.
    #[derive(Debug, Clone)]
    pub struct FileStore {
        dir: PathBuf,
    }

    impl FileStore {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        fn path_for(&self, key: &str) -> PathBuf {
            let name: String = key
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect();
            self.dir.join(format!("{name}.json"))
        }
    }

    impl Store for FileStore {
        fn get_item(&self, key: &str) -> Option<String> {
            fs::read_to_string(self.path_for(key)).ok()
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            fs::create_dir_all(&self.dir)?;
            let path = self.path_for(key);
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, value)?;
            fs::rename(&tmp, &path)?;
            Ok(())
        }

        fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
            match fs::remove_file(self.path_for(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use super::Store;
    use crate::error::StoreError;

    /// Browser LocalStorage
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStore;

    impl LocalStore {
        fn storage() -> Option<web_sys::Storage> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
        }
    }

    impl Store for LocalStore {
        fn get_item(&self, key: &str) -> Option<String> {
            Self::storage()?.get_item(key).ok().flatten()
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            let storage = Self::storage().ok_or(StoreError::Unavailable)?;
            storage
                .set_item(key, value)
                .map_err(|e| StoreError::Write(format!("{e:?}")))
        }

        fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
            let storage = Self::storage().ok_or(StoreError::Unavailable)?;
            storage
                .remove_item(key)
                .map_err(|e| StoreError::Write(format!("{e:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_overwrites() {
        let mut store = MemoryStore::new();
        assert!(store.get_item("k").is_none());

        store.set_item("k", "one").unwrap();
        store.set_item("k", "two").unwrap();
        assert_eq!(store.get_item("k").as_deref(), Some("two"));
        assert_eq!(store.len(), 1);

        store.remove_item("k").unwrap();
        assert!(store.is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!(
            "battle-box-store-test-{}",
            std::process::id()
        ));
        let mut store = FileStore::new(&dir);

        assert!(store.get_item("arena:lastGame").is_none());
        store.set_item("arena:lastGame", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get_item("arena:lastGame").as_deref(),
            Some("{\"a\":1}")
        );

        store.remove_item("arena:lastGame").unwrap();
        assert!(store.get_item("arena:lastGame").is_none());
        // Removing twice is fine
        store.remove_item("arena:lastGame").unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }
}
