use serde::{Deserialize, Serialize};

/// One cloud's alias set from instance discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudDiscoveryMetadata {
    pub preferred_network: String,
    /// Alias written into cache entities for this cloud.
    pub preferred_cache: String,
    pub aliases: Vec<String>,
}

impl CloudDiscoveryMetadata {
    /// Metadata for a host with no known aliases.
    pub fn for_host(host: &str) -> Self {
        Self {
            preferred_network: host.to_string(),
            preferred_cache: host.to_string(),
            aliases: vec![host.to_string()],
        }
    }

    pub fn contains_alias(&self, host: &str) -> bool {
        self.aliases
            .iter()
            .any(|alias| alias.eq_ignore_ascii_case(host))
    }
}

/// Instance-discovery response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceDiscoveryResponse {
    #[serde(default)]
    pub tenant_discovery_endpoint: Option<String>,
    #[serde(default)]
    pub metadata: Vec<CloudDiscoveryMetadata>,
    #[serde(default)]
    pub error: Option<String>,
}

impl InstanceDiscoveryResponse {
    pub fn metadata_for(&self, host: &str) -> Option<&CloudDiscoveryMetadata> {
        self.metadata.iter().find(|entry| entry.contains_alias(host))
    }
}

/// Subset of the OIDC configuration document the cache needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenIdConfiguration {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub issuer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_session_endpoint: Option<String>,
}

/// Everything the registry knows about one authority host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityMetadata {
    pub host: String,
    pub cloud: CloudDiscoveryMetadata,
    /// `None` when seeded from cloud metadata alone.
    pub endpoints: Option<OpenIdConfiguration>,
}

impl AuthorityMetadata {
    pub fn new(host: impl Into<String>, cloud: CloudDiscoveryMetadata) -> Self {
        Self {
            host: host.into(),
            cloud,
            endpoints: None,
        }
    }

    pub fn with_endpoints(mut self, endpoints: OpenIdConfiguration) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// True iff `environment` is the authority's own host or one of its
    /// aliases.
    pub fn is_trusted_environment(&self, environment: &str) -> bool {
        self.host.eq_ignore_ascii_case(environment) || self.cloud.contains_alias(environment)
    }

    pub fn preferred_cache(&self) -> &str {
        &self.cloud.preferred_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn public_cloud() -> CloudDiscoveryMetadata {
        CloudDiscoveryMetadata {
            preferred_network: "login.microsoftonline.com".to_string(),
            preferred_cache: "login.windows.net".to_string(),
            aliases: vec![
                "login.microsoftonline.com".to_string(),
                "login.windows.net".to_string(),
                "sts.windows.net".to_string(),
            ],
        }
    }

    #[test]
    fn trusts_host_and_aliases_case_insensitively() {
        let metadata = AuthorityMetadata::new("login.microsoftonline.com", public_cloud());
        assert!(metadata.is_trusted_environment("login.microsoftonline.com"));
        assert!(metadata.is_trusted_environment("STS.windows.net"));
        assert!(!metadata.is_trusted_environment("login.evil.example"));
    }

    #[test]
    fn own_host_is_trusted_without_alias_entry() {
        let metadata = AuthorityMetadata::new(
            "fs.contoso.com",
            CloudDiscoveryMetadata {
                aliases: Vec::new(),
                ..CloudDiscoveryMetadata::for_host("fs.contoso.com")
            },
        );
        assert!(metadata.is_trusted_environment("fs.contoso.com"));
    }

    #[test]
    fn instance_discovery_finds_entry_by_alias() {
        let body = r#"{
            "tenant_discovery_endpoint": "https://login.microsoftonline.com/common/v2.0/.well-known/openid-configuration",
            "metadata": [
                {"preferred_network":"login.microsoftonline.com","preferred_cache":"login.windows.net","aliases":["login.microsoftonline.com","login.windows.net"]},
                {"preferred_network":"login.partner.microsoftonline.cn","preferred_cache":"login.partner.microsoftonline.cn","aliases":["login.partner.microsoftonline.cn","login.chinacloudapi.cn"]}
            ]
        }"#;
        let response: InstanceDiscoveryResponse = serde_json::from_str(body).unwrap();
        let entry = response.metadata_for("login.chinacloudapi.cn").unwrap();
        assert_eq!(entry.preferred_cache, "login.partner.microsoftonline.cn");
        assert!(response.metadata_for("example.com").is_none());
    }
}
