//! Cache entities and the typed cache manager.

pub mod entities;
pub mod manager;
pub mod scopes;

pub use entities::{
    AccessTokenEntity, AccountEntity, AccountFilter, AccountKey, CacheEntity, CacheRecord,
    CredentialFilter, CredentialKey, CredentialType, EntityKey, EntityKind, IdTokenEntity,
    RefreshTokenEntity,
};
pub use manager::CacheManager;
pub use scopes::ScopeSet;
