use tracing::{debug, warn};

use crate::config::ClearScope;
use crate::error::Result;
use crate::storage::keys::client_namespace;
use crate::storage::CacheStorage;

use super::entities::{
    AccessTokenEntity, AccountEntity, AccountFilter, CacheEntity, CacheRecord, CredentialFilter,
    CredentialType, EntityKey, EntityKind, IdTokenEntity, RefreshTokenEntity,
};

/// Typed CRUD over cache entities.
///
/// Corrupt stored values are treated as misses; only storage failures are
/// returned as errors.
#[derive(Debug, Clone)]
pub struct CacheManager {
    storage: CacheStorage,
}

impl CacheManager {
    pub fn new(storage: CacheStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn client_id(&self) -> &str {
        self.storage.client_id()
    }

    /// Write (or overwrite) an entity under its canonical key.
    pub fn write<E: CacheEntity>(&self, entity: &E) -> Result<()> {
        let key = entity.cache_key();
        let value = serde_json::to_string(entity)?;
        self.storage.set(&key, &value)?;
        debug!(kind = %E::KIND, key = %self.storage.generate_key(&key), "cache entity written");
        Ok(())
    }

    pub fn read<E: CacheEntity>(&self, key: &E::Key) -> Result<Option<E>> {
        let cache_key = key.cache_key();
        let Some(raw) = self.storage.get(&cache_key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<E>(&raw) {
            Ok(entity) if entity.is_kind() => Ok(Some(entity)),
            Ok(_) => Ok(None),
            Err(error) => {
                warn!(
                    key = %self.storage.generate_key(&cache_key),
                    %error,
                    "skipping corrupt cache entry"
                );
                Ok(None)
            }
        }
    }

    pub fn remove<E: CacheEntity>(&self, key: &E::Key) -> Result<bool> {
        self.storage.remove(&key.cache_key())
    }

    /// Every entity of kind `E` in this client's namespace matching `filter`.
    pub fn find_all<E: CacheEntity>(&self, filter: &E::Filter) -> Result<Vec<E>> {
        let namespace = client_namespace(self.client_id());
        let mut found = Vec::new();
        for key in self.storage.keys()? {
            let Some(logical) = key.strip_prefix(&namespace) else {
                continue;
            };
            if !key_has_shape(logical, E::KIND) {
                continue;
            }
            let Some(raw) = self.storage.get(&key)? else {
                continue;
            };
            match serde_json::from_str::<E>(&raw) {
                Ok(entity) if entity.is_kind() && entity.matches(filter) => found.push(entity),
                Ok(_) => {}
                Err(error) => debug!(%key, %error, "ignoring unparseable cache entry"),
            }
        }
        Ok(found)
    }

    /// Persist each present member of `record`. Writes are independent; a
    /// failure leaves earlier writes in place.
    pub fn save_cache_record(&self, record: &CacheRecord) -> Result<()> {
        if let Some(account) = &record.account {
            self.write(account)?;
        }
        if let Some(id_token) = &record.id_token {
            self.write(id_token)?;
        }
        if let Some(access_token) = &record.access_token {
            self.write(access_token)?;
        }
        if let Some(refresh_token) = &record.refresh_token {
            self.write(refresh_token)?;
        }
        Ok(())
    }

    pub fn accounts(&self) -> Result<Vec<AccountEntity>> {
        self.find_all::<AccountEntity>(&AccountFilter::default())
    }

    /// Remove an account and every credential bound to it. Returns the number
    /// of entries removed.
    pub fn remove_account(&self, account: &AccountEntity) -> Result<usize> {
        let filter = CredentialFilter::for_account(&account.home_account_id, &account.environment);
        let mut removed = 0;
        for entity in self.find_all::<IdTokenEntity>(&filter)? {
            removed += usize::from(self.remove::<IdTokenEntity>(&entity.key())?);
        }
        for entity in self.find_all::<AccessTokenEntity>(&filter)? {
            removed += usize::from(self.remove::<AccessTokenEntity>(&entity.key())?);
        }
        for entity in self.find_all::<RefreshTokenEntity>(&filter)? {
            removed += usize::from(self.remove::<RefreshTokenEntity>(&entity.key())?);
        }
        removed += usize::from(self.remove::<AccountEntity>(&account.key())?);
        debug!(home_account_id = %account.home_account_id, removed, "account removed from cache");
        Ok(removed)
    }

    pub fn clear(&self, scope: ClearScope) -> Result<usize> {
        self.storage.clear(scope)
    }
}

const CREDENTIAL_SEGMENTS: [CredentialType; 3] = [
    CredentialType::IdToken,
    CredentialType::AccessToken,
    CredentialType::RefreshToken,
];

/// Cheap structural check before deserializing: credential keys carry their
/// type segment, account keys carry none.
fn key_has_shape(logical_key: &str, kind: EntityKind) -> bool {
    let has_segment =
        |credential_type: CredentialType| logical_key.contains(&format!("-{}-", credential_type.key_segment()));
    match kind {
        EntityKind::Credential(credential_type) => has_segment(credential_type),
        EntityKind::Account => !CREDENTIAL_SEGMENTS.into_iter().any(has_segment),
    }
}
