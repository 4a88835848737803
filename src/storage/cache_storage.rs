use tracing::debug;

use crate::config::{CacheConfig, CacheLocation, ClearScope};
use crate::error::{CacheError, Result};

use super::backend::{Backend, KeyValueStore};
use super::cookie::CookieJar;
use super::file::FileStore;
use super::keys;

/// Stores the host environment makes available.
///
/// A host may lack either store kind; [`StorageHost::detached`] models a
/// host with no storage APIs at all.
#[derive(Debug, Clone, Default)]
pub struct StorageHost {
    durable: Option<Backend>,
    session: Option<Backend>,
    cookies: CookieJar,
    detached: bool,
}

impl StorageHost {
    /// Host with no stores registered yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host whose durable and session stores are both in memory.
    pub fn in_memory() -> Self {
        Self::new()
            .with_durable(Backend::memory())
            .with_session(Backend::memory())
    }

    /// Durable file store under the configured cache dir, session in memory.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let file = FileStore::open_in_dir(config.resolved_cache_dir())?;
        Ok(Self::new()
            .with_durable(Backend::File(file))
            .with_session(Backend::memory()))
    }

    pub fn detached() -> Self {
        Self {
            detached: true,
            ..Self::default()
        }
    }

    pub fn with_durable(mut self, backend: Backend) -> Self {
        self.durable = Some(backend);
        self
    }

    pub fn with_session(mut self, backend: Backend) -> Self {
        self.session = Some(backend);
        self
    }

    pub fn with_cookies(mut self, cookies: CookieJar) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn store(&self, location: CacheLocation) -> Option<&Backend> {
        match location {
            CacheLocation::Durable => self.durable.as_ref(),
            CacheLocation::Session => self.session.as_ref(),
        }
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }
}

/// Namespaced key/value cache over one host store, with an optional cookie
/// mirror.
///
/// # Example
/// ```
/// use authcache::config::CacheConfig;
/// use authcache::storage::{CacheStorage, StorageHost};
///
/// let config = CacheConfig::builder().client_id("my-client").build();
/// let storage = CacheStorage::new(&config, &StorageHost::in_memory())?;
/// storage.set("request.state", "abc")?;
/// assert!(storage.keys()?.contains(&"msal.my-client.request.state".to_string()));
/// # Ok::<(), authcache::error::CacheError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CacheStorage {
    client_id: String,
    location: CacheLocation,
    store: Backend,
    cookies: CookieJar,
    store_auth_state_in_cookie: bool,
    cookie_life_days: Option<u32>,
    clear_scope: ClearScope,
}

impl CacheStorage {
    /// Bind to the store `config.cache_location` names and migrate legacy
    /// entries.
    pub fn new(config: &CacheConfig, host: &StorageHost) -> Result<Self> {
        config.validate()?;
        if host.detached {
            return Err(CacheError::StorageUnavailable(
                "host exposes no storage".to_string(),
            ));
        }
        let store = host
            .store(config.cache_location)
            .cloned()
            .ok_or_else(|| CacheError::StorageUnsupported(config.cache_location.to_string()))?;

        let storage = Self {
            client_id: config.client_id.clone(),
            location: config.cache_location,
            store,
            cookies: host.cookies.clone(),
            store_auth_state_in_cookie: config.store_auth_state_in_cookie,
            cookie_life_days: config.cookie_life_days,
            clear_scope: config.clear_scope,
        };
        storage.migrate_cache_entries()?;
        Ok(storage)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn location(&self) -> CacheLocation {
        self.location
    }

    /// Configured scope for [`Self::clear`].
    pub fn clear_scope(&self) -> ClearScope {
        self.clear_scope
    }

    pub fn cookie_mirror_enabled(&self) -> bool {
        self.store_auth_state_in_cookie
    }

    pub fn set_cookie_mirror(&mut self, enabled: bool) {
        self.store_auth_state_in_cookie = enabled;
    }

    /// Physical key for `key` under this client.
    pub fn generate_key(&self, key: &str) -> String {
        keys::generate_key(&self.client_id, key)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let cache_key = self.generate_key(key);
        self.store.set_item(&cache_key, value)?;
        if self.store_auth_state_in_cookie {
            self.set_cookie(&cache_key, value, self.cookie_life_days.map(i64::from));
        }
        Ok(())
    }

    /// Read a value; a non-empty mirrored cookie wins over the store.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let cache_key = self.generate_key(key);
        if self.store_auth_state_in_cookie {
            let cookie = self.get_cookie(&cache_key);
            if !cookie.is_empty() {
                debug!(key = %cache_key, "cache read served from cookie");
                return Ok(Some(cookie));
            }
        }
        self.store.get_item(&cache_key)
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        self.remove_physical(&self.generate_key(key))
    }

    pub fn contains(&self, key: &str) -> Result<bool> {
        let cache_key = self.generate_key(key);
        Ok(self.store.contains_key(&cache_key)? || self.store.contains_key(key)?)
    }

    /// Every key in the underlying store, including other clients' keys.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.store.keys()
    }

    /// Remove the keys that belong to this client. Returns how many were
    /// removed.
    pub fn clear(&self, scope: ClearScope) -> Result<usize> {
        let namespace = keys::client_namespace(&self.client_id);
        let mut removed = 0;
        for key in self.store.keys()? {
            let owned = match scope {
                ClearScope::LegacySubstring => {
                    key.contains(keys::CACHE_PREFIX) && key.contains(&self.client_id)
                }
                ClearScope::ClientPrefix => key.starts_with(&namespace),
            };
            if owned && self.remove_physical(&key)? {
                removed += 1;
            }
        }
        debug!(client_id = %self.client_id, %scope, removed, "cleared cache");
        Ok(removed)
    }

    pub fn set_cookie(&self, name: &str, value: &str, expires_days: Option<i64>) {
        self.cookies.set_cookie(name, value, expires_days);
    }

    /// Empty string when absent.
    pub fn get_cookie(&self, name: &str) -> String {
        self.cookies.get_cookie(name)
    }

    pub fn clear_cookie(&self, name: &str) {
        self.cookies.clear_cookie(name);
    }

    /// Drop the transient request-state cookies, including the
    /// state-specific nonce when `state` is given.
    pub fn clear_auth_cookies(&self, state: Option<&str>) {
        let nonce_key = match state {
            Some(state) => format!("{}|{state}", keys::temporary::NONCE_IDTOKEN),
            None => keys::temporary::NONCE_IDTOKEN.to_string(),
        };
        self.clear_cookie(&nonce_key);
        self.clear_cookie(keys::temporary::REQUEST_STATE);
        self.clear_cookie(keys::temporary::ORIGIN_URI);
    }

    /// Copy values from the unprefixed schema under their namespaced keys.
    /// Legacy values stay in place for older readers of the same store.
    fn migrate_cache_entries(&self) -> Result<()> {
        for key in keys::LEGACY_MIGRATION_KEYS {
            let Some(value) = self.get(&keys::legacy_key(key))? else {
                continue;
            };
            if value.is_empty() || self.store.contains_key(&self.generate_key(key))? {
                continue;
            }
            debug!(key, "migrating legacy cache entry");
            self.set(key, &value)?;
        }
        Ok(())
    }

    fn remove_physical(&self, cache_key: &str) -> Result<bool> {
        let removed = self.store.remove_item(cache_key)?;
        if self.store_auth_state_in_cookie {
            self.clear_cookie(cache_key);
        }
        Ok(removed)
    }
}
