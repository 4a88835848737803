//! Physical key/value stores.

use crate::error::Result;

use super::file::FileStore;
use super::memory::MemoryStore;

/// Flat string store underneath [`super::CacheStorage`].
///
/// Each call is atomic on its own; nothing spans calls.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    /// Returns whether the key was present.
    fn remove_item(&self, key: &str) -> Result<bool>;
    fn contains_key(&self, key: &str) -> Result<bool>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// Closed set of store implementations, selected at construction.
#[derive(Debug, Clone)]
pub enum Backend {
    /// In-process store, gone when the last handle drops.
    Memory(MemoryStore),
    /// JSON file on disk.
    File(FileStore),
}

impl Backend {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory(_))
    }
}

impl KeyValueStore for Backend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::Memory(store) => store.get_item(key),
            Self::File(store) => store.get_item(key),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Memory(store) => store.set_item(key, value),
            Self::File(store) => store.set_item(key, value),
        }
    }

    fn remove_item(&self, key: &str) -> Result<bool> {
        match self {
            Self::Memory(store) => store.remove_item(key),
            Self::File(store) => store.remove_item(key),
        }
    }

    fn contains_key(&self, key: &str) -> Result<bool> {
        match self {
            Self::Memory(store) => store.contains_key(key),
            Self::File(store) => store.contains_key(key),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        match self {
            Self::Memory(store) => store.keys(),
            Self::File(store) => store.keys(),
        }
    }
}
