use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CacheError, Result};

use super::metadata::{
    AuthorityMetadata, CloudDiscoveryMetadata, InstanceDiscoveryResponse, OpenIdConfiguration,
};
use super::{Authority, AuthorityType};

const DEFAULT_INSTANCE_DISCOVERY_URL: &str =
    "https://login.microsoftonline.com/common/discovery/instance";
const INSTANCE_DISCOVERY_API_VERSION: &str = "1.1";

/// Source of authority metadata.
///
/// `Ok(None)` means the source has no metadata for the authority. An
/// authority the source explicitly rejects is `UntrustedAuthority`; any other
/// `Err` is a transport or payload failure.
#[async_trait]
pub trait MetadataDiscovery: Send + Sync {
    async fn discover(&self, authority: &Authority) -> Result<Option<AuthorityMetadata>>;
}

/// Fixed metadata table, keyed by lower-cased host. Never touches the network.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    entries: HashMap<String, AuthorityMetadata>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: AuthorityMetadata) -> Self {
        self.entries
            .insert(metadata.host.to_ascii_lowercase(), metadata);
        self
    }

    /// Register every alias of every cloud in a cloud-discovery document
    /// (`{"metadata": [{preferred_network, preferred_cache, aliases}]}`).
    pub fn from_cloud_discovery_json(json: &str) -> Result<Self> {
        let mut discovery = Self::new();
        for metadata in parse_cloud_discovery(json)? {
            discovery.entries.extend(expand_aliases(&metadata));
        }
        Ok(discovery)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl MetadataDiscovery for StaticDiscovery {
    async fn discover(&self, authority: &Authority) -> Result<Option<AuthorityMetadata>> {
        Ok(self.entries.get(authority.host()).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct CloudDiscoveryDocument {
    #[serde(default)]
    metadata: Vec<CloudDiscoveryMetadata>,
}

pub(crate) fn parse_cloud_discovery(json: &str) -> Result<Vec<CloudDiscoveryMetadata>> {
    let document: CloudDiscoveryDocument = serde_json::from_str(json)?;
    Ok(document.metadata)
}

/// One registry entry per alias, each sharing the cloud's metadata.
pub(crate) fn expand_aliases(
    cloud: &CloudDiscoveryMetadata,
) -> impl Iterator<Item = (String, AuthorityMetadata)> + '_ {
    cloud.aliases.iter().map(move |alias| {
        let host = alias.to_ascii_lowercase();
        (host.clone(), AuthorityMetadata::new(host, cloud.clone()))
    })
}

/// Live discovery against the instance-discovery and OIDC configuration
/// endpoints.
pub struct HttpDiscovery {
    client: reqwest::Client,
    instance_discovery_url: String,
    endpoint_base_url: Option<String>,
}

impl HttpDiscovery {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            instance_discovery_url: DEFAULT_INSTANCE_DISCOVERY_URL.to_string(),
            endpoint_base_url: None,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_instance_discovery_url(mut self, url: impl Into<String>) -> Self {
        self.instance_discovery_url = url.into();
        self
    }

    /// Fetch OIDC configuration from `base` instead of `https://<host>`.
    pub fn with_endpoint_base_url(mut self, base: impl Into<String>) -> Self {
        self.endpoint_base_url = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    fn openid_configuration_url(&self, authority: &Authority) -> String {
        let base = self
            .endpoint_base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", authority.host()));
        format!("{base}{}", authority.openid_configuration_path())
    }

    async fn instance_metadata(
        &self,
        authority: &Authority,
    ) -> Result<Option<CloudDiscoveryMetadata>> {
        if authority.authority_type() != AuthorityType::Mssts {
            return Ok(Some(CloudDiscoveryMetadata::for_host(authority.host())));
        }

        let resp = self
            .client
            .get(&self.instance_discovery_url)
            .query(&[
                ("api-version", INSTANCE_DISCOVERY_API_VERSION),
                (
                    "authorization_endpoint",
                    authority.authorization_endpoint().as_str(),
                ),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = resp.status();
        if status.is_server_error() {
            return Err(CacheError::DiscoveryFailed {
                host: authority.host().to_string(),
                reason: format!("instance discovery failed with status {status}"),
            });
        }

        let payload: InstanceDiscoveryResponse = if status.is_success() {
            resp.json().await?
        } else {
            resp.json().await.unwrap_or_default()
        };
        if let Some(error) = payload.error.as_deref() {
            debug!(host = authority.host(), error, "instance discovery rejected authority");
            return Err(CacheError::UntrustedAuthority(format!(
                "{}: {error}",
                authority.canonical_authority()
            )));
        }
        if !status.is_success() {
            debug!(host = authority.host(), %status, "instance discovery returned no metadata");
            return Ok(None);
        }
        Ok(Some(
            payload
                .metadata_for(authority.host())
                .cloned()
                .unwrap_or_else(|| CloudDiscoveryMetadata::for_host(authority.host())),
        ))
    }

    async fn openid_configuration(&self, authority: &Authority) -> Result<OpenIdConfiguration> {
        let url = self.openid_configuration_url(authority);
        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(CacheError::DiscoveryFailed {
                host: authority.host().to_string(),
                reason: format!(
                    "openid configuration request failed with status {}",
                    resp.status()
                ),
            });
        }
        resp.json().await.map_err(|e| CacheError::DiscoveryFailed {
            host: authority.host().to_string(),
            reason: format!("malformed openid configuration: {e}"),
        })
    }
}

impl Default for HttpDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataDiscovery for HttpDiscovery {
    async fn discover(&self, authority: &Authority) -> Result<Option<AuthorityMetadata>> {
        let Some(cloud) = self.instance_metadata(authority).await? else {
            return Ok(None);
        };
        let endpoints = self.openid_configuration(authority).await?;
        debug!(
            host = authority.host(),
            preferred_cache = %cloud.preferred_cache,
            aliases = cloud.aliases.len(),
            "authority metadata discovered"
        );
        Ok(Some(
            AuthorityMetadata::new(authority.host(), cloud).with_endpoints(endpoints),
        ))
    }
}
