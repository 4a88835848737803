//! authcache: token-cache core for OAuth2/OIDC clients.
//!
//! Turns token endpoint responses into namespaced cache entries, after
//! checking that the token's issuing environment belongs to the authority
//! the application trusts.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use authcache::prelude::*;
//!
//! # fn example() -> authcache::error::Result<()> {
//! let config = CacheConfig::builder().client_id("my-client").build();
//! let storage = CacheStorage::new(&config, &StorageHost::in_memory())?;
//!
//! let registry = Arc::new(TrustRegistry::offline());
//! registry.seed_cloud_discovery_json(
//!     r#"{"metadata":[{"preferred_network":"login.microsoftonline.com",
//!         "preferred_cache":"login.windows.net",
//!         "aliases":["login.microsoftonline.com","login.windows.net"]}]}"#,
//! )?;
//!
//! let handler = ResponseHandler::new(
//!     "my-client",
//!     CacheManager::new(storage),
//!     Arc::new(DefaultCrypto),
//!     registry,
//! );
//! let authority = Authority::parse("https://login.microsoftonline.com/common")?;
//! let response = ServerTokenResponse {
//!     access_token: Some("AT".to_string()),
//!     scope: Some("user.read".to_string()),
//!     expires_in: Some(3600),
//!     ..ServerTokenResponse::default()
//! };
//! let result = handler.handle(&response, &authority)?;
//! assert_eq!(result.access_token, "AT");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod authority;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod error;
pub mod prelude;
pub mod response;
pub mod storage;
