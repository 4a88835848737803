//! Convenience re-exports for common use.

pub use crate::authority::{Authority, AuthorityType, TrustDecision, TrustRegistry};
pub use crate::cache::{
    AccessTokenEntity, AccountEntity, CacheManager, CacheRecord, CredentialFilter,
    IdTokenEntity, RefreshTokenEntity, ScopeSet,
};
pub use crate::config::{CacheConfig, CacheLocation, ClearScope};
pub use crate::crypto::{CryptoProvider, DefaultCrypto};
pub use crate::error::{CacheError, Result};
pub use crate::response::{AccountInfo, AuthenticationResult, ResponseHandler, ServerTokenResponse};
pub use crate::storage::{CacheStorage, StorageHost};
