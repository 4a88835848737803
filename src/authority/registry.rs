use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};

use super::discovery::{expand_aliases, parse_cloud_discovery, MetadataDiscovery, StaticDiscovery};
use super::metadata::AuthorityMetadata;
use super::Authority;

/// Outcome of checking a token's environment against an authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustDecision {
    /// Environment is an alias of the authority; carries the alias to cache
    /// under.
    Trusted { environment: String },
    /// Authority metadata is known and the environment is not one of its
    /// aliases.
    Untrusted,
    /// No metadata has been resolved for the authority host.
    Undiscovered,
}

impl TrustDecision {
    pub fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted { .. })
    }
}

/// Per-host cache of authority metadata.
///
/// Entries live until [`invalidate`](Self::invalidate) or
/// [`invalidate_all`](Self::invalidate_all). Discovery runs one authority at
/// a time, so concurrent `resolve` calls for an uncached host share a single
/// fetch.
pub struct TrustRegistry {
    discovery: Arc<dyn MetadataDiscovery>,
    entries: RwLock<HashMap<String, AuthorityMetadata>>,
    discovery_lock: tokio::sync::Mutex<()>,
}

impl TrustRegistry {
    pub fn new(discovery: Arc<dyn MetadataDiscovery>) -> Self {
        Self {
            discovery,
            entries: RwLock::new(HashMap::new()),
            discovery_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Registry with no discovery source; only seeded hosts resolve.
    pub fn offline() -> Self {
        Self::new(Arc::new(StaticDiscovery::new()))
    }

    pub fn seed(&self, metadata: AuthorityMetadata) {
        let host = metadata.host.to_ascii_lowercase();
        self.write_entries().insert(host, metadata);
    }

    /// Seed every alias of a cloud-discovery document. Returns the number of
    /// hosts registered.
    pub fn seed_cloud_discovery_json(&self, json: &str) -> Result<usize> {
        let clouds = parse_cloud_discovery(json)?;
        let mut entries = self.write_entries();
        let mut seeded = 0;
        for cloud in &clouds {
            for (host, metadata) in expand_aliases(cloud) {
                entries.insert(host, metadata);
                seeded += 1;
            }
        }
        info!(hosts = seeded, "seeded authority metadata");
        Ok(seeded)
    }

    /// Cached metadata for `host`, without discovery.
    pub fn cached(&self, host: &str) -> Option<AuthorityMetadata> {
        self.read_entries().get(&host.to_ascii_lowercase()).cloned()
    }

    /// Cached metadata for the authority, running discovery on a miss.
    pub async fn resolve(&self, authority: &Authority) -> Result<AuthorityMetadata> {
        if let Some(metadata) = self.cached(authority.host()) {
            return Ok(metadata);
        }

        let _discovering = self.discovery_lock.lock().await;
        if let Some(metadata) = self.cached(authority.host()) {
            debug!(host = authority.host(), "authority metadata resolved by concurrent caller");
            return Ok(metadata);
        }
        debug!(host = authority.host(), "authority metadata cache miss");
        let discovered = self.discovery.discover(authority).await?;
        let Some(metadata) = discovered else {
            warn!(host = authority.host(), "authority could not be discovered");
            return Err(CacheError::DiscoveryFailed {
                host: authority.host().to_string(),
                reason: "no metadata available for authority".to_string(),
            });
        };
        debug!(host = authority.host(), "caching discovered authority metadata");
        self.write_entries()
            .insert(authority.host().to_string(), metadata.clone());
        Ok(metadata)
    }

    /// Trust check against cached metadata only.
    pub fn check(&self, authority: &Authority, environment: &str) -> TrustDecision {
        match self.cached(authority.host()) {
            None => TrustDecision::Undiscovered,
            Some(metadata) if metadata.is_trusted_environment(environment) => {
                TrustDecision::Trusted {
                    environment: metadata.preferred_cache().to_string(),
                }
            }
            Some(_) => TrustDecision::Untrusted,
        }
    }

    /// Drop the entry for `host`. Returns whether one existed.
    pub fn invalidate(&self, host: &str) -> bool {
        let removed = self
            .write_entries()
            .remove(&host.to_ascii_lowercase())
            .is_some();
        if removed {
            debug!(host, "authority metadata invalidated");
        }
        removed
    }

    pub fn invalidate_all(&self) {
        self.write_entries().clear();
        debug!("all authority metadata invalidated");
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, AuthorityMetadata>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, AuthorityMetadata>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for TrustRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustRegistry")
            .field("hosts", &self.read_entries().len())
            .finish_non_exhaustive()
    }
}
