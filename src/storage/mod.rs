//! Storage backend: key namespacing, host stores, and the cookie mirror.

pub mod backend;
pub mod cache_storage;
pub mod cookie;
pub mod file;
pub mod keys;
pub mod memory;

pub use backend::{Backend, KeyValueStore};
pub use cache_storage::{CacheStorage, StorageHost};
pub use cookie::CookieJar;
pub use file::FileStore;
pub use keys::{classify_key, generate_key, KeyClass, CACHE_PREFIX};
pub use memory::MemoryStore;
