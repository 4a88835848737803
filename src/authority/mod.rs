//! Authority model, metadata discovery, and the trust registry.

pub mod discovery;
pub mod metadata;
pub mod registry;

pub use discovery::{HttpDiscovery, MetadataDiscovery, StaticDiscovery};
pub use metadata::{
    AuthorityMetadata, CloudDiscoveryMetadata, InstanceDiscoveryResponse, OpenIdConfiguration,
};
pub use registry::{TrustDecision, TrustRegistry};

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Kind of authority that issued an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorityType {
    #[default]
    #[serde(rename = "MSSTS")]
    Mssts,
    #[serde(rename = "ADFS")]
    Adfs,
    /// Plain OIDC provider; no instance discovery.
    #[serde(rename = "Generic")]
    Generic,
}

/// A parsed `https://host[:port]/tenant` authority.
///
/// # Example
/// ```
/// use authcache::authority::Authority;
///
/// let authority = Authority::parse("https://login.microsoftonline.com/common")?;
/// assert_eq!(authority.host(), "login.microsoftonline.com");
/// assert_eq!(authority.tenant(), "common");
/// assert_eq!(
///     authority.canonical_authority(),
///     "https://login.microsoftonline.com/common/"
/// );
/// # Ok::<(), authcache::error::CacheError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    canonical: String,
    host: String,
    tenant: String,
    authority_type: AuthorityType,
}

impl Authority {
    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| CacheError::InvalidAuthority(format!("{url}: {e}")))?;
        if parsed.scheme() != "https" {
            return Err(CacheError::InvalidAuthority(format!(
                "{url}: authority must use https"
            )));
        }
        let host_name = parsed
            .host_str()
            .ok_or_else(|| CacheError::InvalidAuthority(format!("{url}: missing host")))?
            .to_ascii_lowercase();
        let host = match parsed.port() {
            Some(port) => format!("{host_name}:{port}"),
            None => host_name,
        };
        let tenant = parsed
            .path_segments()
            .and_then(|mut segments| segments.find(|segment| !segment.is_empty()))
            .ok_or_else(|| CacheError::InvalidAuthority(format!("{url}: missing tenant")))?
            .to_string();
        let authority_type = if tenant.eq_ignore_ascii_case("adfs") {
            AuthorityType::Adfs
        } else {
            AuthorityType::Mssts
        };

        Ok(Self {
            canonical: format!("https://{host}/{tenant}/"),
            host,
            tenant,
            authority_type,
        })
    }

    /// `https://host/tenant/`, always with a trailing slash.
    pub fn canonical_authority(&self) -> &str {
        &self.canonical
    }

    /// Host name, with the port when one was given.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn authority_type(&self) -> AuthorityType {
        self.authority_type
    }

    /// Override the detected authority type, e.g. for a non-Microsoft OIDC
    /// provider.
    pub fn with_authority_type(mut self, authority_type: AuthorityType) -> Self {
        self.authority_type = authority_type;
        self
    }

    pub fn authorization_endpoint(&self) -> String {
        match self.authority_type {
            AuthorityType::Adfs => format!("{}oauth2/authorize", self.canonical),
            AuthorityType::Mssts => format!("{}oauth2/v2.0/authorize", self.canonical),
            AuthorityType::Generic => format!("{}authorize", self.canonical),
        }
    }

    /// Path of the OIDC configuration document, relative to the host.
    pub fn openid_configuration_path(&self) -> String {
        match self.authority_type {
            AuthorityType::Adfs | AuthorityType::Generic => {
                format!("/{}/.well-known/openid-configuration", self.tenant)
            }
            AuthorityType::Mssts => {
                format!("/{}/v2.0/.well-known/openid-configuration", self.tenant)
            }
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_port_and_lowercases_host() {
        let authority = Authority::parse("https://Login.Example.com:8443/tenant-id/v2.0").unwrap();
        assert_eq!(authority.host(), "login.example.com:8443");
        assert_eq!(authority.tenant(), "tenant-id");
        assert_eq!(
            authority.canonical_authority(),
            "https://login.example.com:8443/tenant-id/"
        );
    }

    #[test]
    fn detects_adfs() {
        let authority = Authority::parse("https://fs.contoso.com/adfs").unwrap();
        assert_eq!(authority.authority_type(), AuthorityType::Adfs);
        assert_eq!(
            authority.openid_configuration_path(),
            "/adfs/.well-known/openid-configuration"
        );
    }

    #[test]
    fn rejects_http_and_missing_tenant() {
        assert!(matches!(
            Authority::parse("http://login.microsoftonline.com/common"),
            Err(CacheError::InvalidAuthority(_))
        ));
        assert!(matches!(
            Authority::parse("https://login.microsoftonline.com/"),
            Err(CacheError::InvalidAuthority(_))
        ));
        assert!(matches!(
            Authority::parse("not a url"),
            Err(CacheError::InvalidAuthority(_))
        ));
    }

    #[test]
    fn authorization_endpoint_uses_v2_for_aad() {
        let authority = Authority::parse("https://login.microsoftonline.com/common").unwrap();
        assert_eq!(
            authority.authorization_endpoint(),
            "https://login.microsoftonline.com/common/oauth2/v2.0/authorize"
        );
    }
}
