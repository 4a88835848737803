//! Cache configuration (layered: code > env > TOML file).

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{CacheError, Result};

/// Which host store backs the cache.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum CacheLocation {
    /// Survives process restarts.
    #[serde(rename = "localStorage", alias = "durable")]
    #[strum(to_string = "localStorage", serialize = "durable")]
    Durable,
    /// Lives as long as the hosting session.
    #[default]
    #[serde(rename = "sessionStorage", alias = "session")]
    #[strum(to_string = "sessionStorage", serialize = "session")]
    Session,
}

impl CacheLocation {
    /// Parse a location name, failing with `StorageUnsupported` on anything
    /// other than the two recognized kinds.
    pub fn parse(value: &str) -> Result<Self> {
        Self::from_str(value.trim()).map_err(|_| CacheError::StorageUnsupported(value.to_string()))
    }
}

/// How `clear` decides which keys belong to the active client.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
pub enum ClearScope {
    /// Keys under `<prefix>.<client-id>.` only.
    #[default]
    #[strum(to_string = "prefix", serialize = "client_prefix")]
    ClientPrefix,
    /// Any key containing both the prefix and the client id as substrings.
    #[strum(to_string = "substring", serialize = "legacy_substring")]
    LegacySubstring,
}

/// Configuration for a [`crate::storage::CacheStorage`] instance.
///
/// # Example
/// ```
/// use authcache::config::{CacheConfig, CacheLocation};
///
/// let config = CacheConfig::builder()
///     .client_id("0813e1d1-ad72-46a9-8665-399bba48c201")
///     .cache_location(CacheLocation::Durable)
///     .store_auth_state_in_cookie(true)
///     .build();
/// assert_eq!(config.cache_location.to_string(), "localStorage");
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    #[builder(into)]
    pub client_id: String,
    #[builder(default)]
    #[serde(default)]
    pub cache_location: CacheLocation,
    #[builder(default)]
    #[serde(default)]
    pub store_auth_state_in_cookie: bool,
    /// Lifetime of mirrored cookies; `None` writes session cookies.
    pub cookie_life_days: Option<u32>,
    #[builder(default)]
    #[serde(default)]
    pub clear_scope: ClearScope,
    /// Directory for the durable file store; defaults to `~/.authcache`.
    pub cache_dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Load from environment variables, reading `.env` first if present.
    ///
    /// `AUTHCACHE_CLIENT_ID` is required; every other variable is optional.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let client_id = std::env::var("AUTHCACHE_CLIENT_ID").map_err(|_| {
            CacheError::Configuration("AUTHCACHE_CLIENT_ID is not set".to_string())
        })?;

        let cache_location = match std::env::var("AUTHCACHE_CACHE_LOCATION") {
            Ok(value) => CacheLocation::parse(&value)?,
            Err(_) => CacheLocation::default(),
        };

        let store_auth_state_in_cookie = match std::env::var("AUTHCACHE_STORE_AUTH_STATE_IN_COOKIE")
        {
            Ok(value) => parse_bool(&value)?,
            Err(_) => false,
        };

        let cookie_life_days = match std::env::var("AUTHCACHE_COOKIE_LIFE_DAYS") {
            Ok(value) => Some(value.trim().parse::<u32>().map_err(|_| {
                CacheError::Configuration(format!("invalid AUTHCACHE_COOKIE_LIFE_DAYS: {value}"))
            })?),
            Err(_) => None,
        };

        let clear_scope = match std::env::var("AUTHCACHE_CLEAR_SCOPE") {
            Ok(value) => ClearScope::from_str(value.trim()).map_err(|_| {
                CacheError::Configuration(format!("invalid AUTHCACHE_CLEAR_SCOPE: {value}"))
            })?,
            Err(_) => ClearScope::default(),
        };

        let config = Self {
            client_id,
            cache_location,
            store_auth_state_in_cookie,
            cookie_life_days,
            clear_scope,
            cache_dir: std::env::var_os("AUTHCACHE_CACHE_DIR").map(PathBuf::from),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(CacheError::Configuration(
                "client_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Durable store directory, falling back to [`Self::default_cache_dir`].
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(Self::default_cache_dir)
    }

    pub fn default_cache_dir() -> PathBuf {
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().join(".authcache"))
            .unwrap_or_else(|| PathBuf::from(".authcache"))
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" => Ok(true),
        "0" | "false" | "FALSE" | "no" | "" => Ok(false),
        other => Err(CacheError::Configuration(format!(
            "invalid boolean value: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_location_accepts_both_spellings() {
        assert_eq!(CacheLocation::parse("localStorage").unwrap(), CacheLocation::Durable);
        assert_eq!(CacheLocation::parse("durable").unwrap(), CacheLocation::Durable);
        assert_eq!(CacheLocation::parse("sessionStorage").unwrap(), CacheLocation::Session);
        assert_eq!(CacheLocation::parse(" session ").unwrap(), CacheLocation::Session);
    }

    #[test]
    fn cache_location_rejects_unknown_kind() {
        let err = CacheLocation::parse("indexedDB").unwrap_err();
        assert!(matches!(err, CacheError::StorageUnsupported(ref kind) if kind == "indexedDB"));
    }

    #[test]
    fn clear_scope_parses_aliases() {
        assert_eq!(ClearScope::from_str("prefix").unwrap(), ClearScope::ClientPrefix);
        assert_eq!(
            ClearScope::from_str("substring").unwrap(),
            ClearScope::LegacySubstring
        );
    }

    #[test]
    fn builder_applies_defaults() {
        let config = CacheConfig::builder().client_id("client").build();
        assert_eq!(config.cache_location, CacheLocation::Session);
        assert!(!config.store_auth_state_in_cookie);
        assert_eq!(config.cookie_life_days, None);
        assert_eq!(config.clear_scope, ClearScope::ClientPrefix);
    }

    #[test]
    fn validate_rejects_blank_client_id() {
        let config = CacheConfig::builder().client_id("  ").build();
        assert!(matches!(
            config.validate(),
            Err(CacheError::Configuration(_))
        ));
    }

    #[test]
    fn parse_bool_handles_common_spellings() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
