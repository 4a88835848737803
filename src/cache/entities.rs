//! Persisted cache records and their canonical keys.
//!
//! Keys are `-`-joined, lower-cased identifying fields:
//! - account: `<homeAccountId>-<environment>-<realm>`
//! - credential: `<homeAccountId>-<environment>-<credentialType>-<clientId>-<realm>-<target>`
//!
//! Two records with the same identifying fields share a key, so a newer token
//! for the same account, client, and scopes replaces the older one.

use bon::Builder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::authority::AuthorityType;
use crate::response::{AccountInfo, ClientInfo, IdToken, IdTokenClaims};

use super::scopes::ScopeSet;

/// Credential discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum CredentialType {
    IdToken,
    AccessToken,
    RefreshToken,
}

impl CredentialType {
    /// Segment used inside canonical keys.
    pub fn key_segment(self) -> &'static str {
        match self {
            Self::IdToken => "idtoken",
            Self::AccessToken => "accesstoken",
            Self::RefreshToken => "refreshtoken",
        }
    }
}

/// Entity kinds the cache manager understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EntityKind {
    Account,
    Credential(CredentialType),
}

/// A record that can be written to and read from the cache.
pub trait CacheEntity: Serialize + DeserializeOwned + Clone {
    type Key: EntityKey;
    type Filter;

    const KIND: EntityKind;

    fn key(&self) -> Self::Key;

    fn matches(&self, filter: &Self::Filter) -> bool;

    fn cache_key(&self) -> String {
        self.key().cache_key()
    }

    /// Whether a deserialized record really is this kind.
    fn is_kind(&self) -> bool {
        true
    }
}

/// Identifying fields of a record.
pub trait EntityKey {
    fn cache_key(&self) -> String;
}

pub fn account_key(home_account_id: &str, environment: &str, realm: &str) -> String {
    [home_account_id, environment, realm]
        .join("-")
        .to_lowercase()
}

pub fn credential_key(
    home_account_id: &str,
    environment: &str,
    credential_type: CredentialType,
    client_id: &str,
    realm: &str,
    target: &str,
) -> String {
    [
        home_account_id,
        environment,
        credential_type.key_segment(),
        client_id,
        realm,
        target,
    ]
    .join("-")
    .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountKey {
    pub home_account_id: String,
    pub environment: String,
    pub realm: String,
}

impl EntityKey for AccountKey {
    fn cache_key(&self) -> String {
        account_key(&self.home_account_id, &self.environment, &self.realm)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialKey {
    pub home_account_id: String,
    pub environment: String,
    pub credential_type: CredentialType,
    pub client_id: String,
    pub realm: String,
    pub target: String,
}

impl EntityKey for CredentialKey {
    fn cache_key(&self) -> String {
        credential_key(
            &self.home_account_id,
            &self.environment,
            self.credential_type,
            &self.client_id,
            &self.realm,
            &self.target,
        )
    }
}

/// Partial account match; `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub home_account_id: Option<String>,
    pub environment: Option<String>,
    pub realm: Option<String>,
}

/// Partial credential match; `None` fields match anything. `target` matches
/// any credential whose scopes include all of the given scopes.
#[derive(Debug, Clone, Default)]
pub struct CredentialFilter {
    pub home_account_id: Option<String>,
    pub environment: Option<String>,
    pub client_id: Option<String>,
    pub realm: Option<String>,
    pub target: Option<ScopeSet>,
}

impl CredentialFilter {
    /// Every credential for one account, across clients and scopes.
    pub fn for_account(home_account_id: &str, environment: &str) -> Self {
        Self {
            home_account_id: Some(home_account_id.to_string()),
            environment: Some(environment.to_string()),
            ..Self::default()
        }
    }

    fn matches_fields(
        &self,
        home_account_id: &str,
        environment: &str,
        client_id: &str,
        realm: &str,
    ) -> bool {
        field_matches(&self.home_account_id, home_account_id)
            && field_matches(&self.environment, environment)
            && field_matches(&self.client_id, client_id)
            && field_matches(&self.realm, realm)
    }
}

fn field_matches(expected: &Option<String>, actual: &str) -> bool {
    expected
        .as_deref()
        .map_or(true, |expected| expected.eq_ignore_ascii_case(actual))
}

/// A signed-in user within one authority realm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEntity {
    pub home_account_id: String,
    pub environment: String,
    pub realm: String,
    pub local_account_id: String,
    pub username: String,
    pub authority_type: AuthorityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token_claims: Option<IdTokenClaims>,
}

impl AccountEntity {
    /// Build an account from a decoded ID token.
    ///
    /// `environment` must already be the trusted, normalized alias. Without
    /// client info the home account id falls back to the `oid`, then `sub`
    /// claim.
    pub fn create(
        client_info: Option<&ClientInfo>,
        raw_client_info: Option<&str>,
        authority_type: AuthorityType,
        environment: &str,
        id_token: &IdToken,
    ) -> Self {
        let claims = &id_token.claims;
        let local_account_id = claims
            .oid
            .clone()
            .or_else(|| claims.sub.clone())
            .unwrap_or_default();
        let home_account_id = match (client_info, authority_type) {
            (Some(info), AuthorityType::Mssts) => info.home_account_id(),
            _ => claims
                .sub
                .clone()
                .unwrap_or_else(|| local_account_id.clone()),
        };
        let username = claims
            .preferred_username
            .clone()
            .or_else(|| claims.upn.clone())
            .or_else(|| claims.emails.as_ref().and_then(|emails| emails.first().cloned()))
            .unwrap_or_default();

        Self {
            home_account_id,
            environment: environment.to_string(),
            realm: claims.tid.clone().unwrap_or_default(),
            local_account_id,
            username,
            authority_type,
            name: claims.name.clone(),
            client_info: raw_client_info.map(str::to_string),
            id_token_claims: Some(claims.clone()),
        }
    }

    /// Caller-facing projection.
    pub fn account_info(&self) -> AccountInfo {
        AccountInfo {
            home_account_id: self.home_account_id.clone(),
            environment: self.environment.clone(),
            tenant_id: self.realm.clone(),
            username: self.username.clone(),
            local_account_id: self.local_account_id.clone(),
            name: self.name.clone(),
        }
    }
}

impl CacheEntity for AccountEntity {
    type Key = AccountKey;
    type Filter = AccountFilter;

    const KIND: EntityKind = EntityKind::Account;

    fn key(&self) -> AccountKey {
        AccountKey {
            home_account_id: self.home_account_id.clone(),
            environment: self.environment.clone(),
            realm: self.realm.clone(),
        }
    }

    fn matches(&self, filter: &AccountFilter) -> bool {
        field_matches(&filter.home_account_id, &self.home_account_id)
            && field_matches(&filter.environment, &self.environment)
            && field_matches(&filter.realm, &self.realm)
    }
}

/// Raw ID token bound to an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdTokenEntity {
    pub home_account_id: String,
    pub environment: String,
    pub credential_type: CredentialType,
    pub client_id: String,
    pub secret: String,
    pub realm: String,
}

impl IdTokenEntity {
    pub fn create(
        home_account_id: &str,
        environment: &str,
        id_token: &str,
        client_id: &str,
        realm: &str,
    ) -> Self {
        Self {
            home_account_id: home_account_id.to_string(),
            environment: environment.to_string(),
            credential_type: CredentialType::IdToken,
            client_id: client_id.to_string(),
            secret: id_token.to_string(),
            realm: realm.to_string(),
        }
    }
}

impl CacheEntity for IdTokenEntity {
    type Key = CredentialKey;
    type Filter = CredentialFilter;

    const KIND: EntityKind = EntityKind::Credential(CredentialType::IdToken);

    fn key(&self) -> CredentialKey {
        CredentialKey {
            home_account_id: self.home_account_id.clone(),
            environment: self.environment.clone(),
            credential_type: CredentialType::IdToken,
            client_id: self.client_id.clone(),
            realm: self.realm.clone(),
            target: String::new(),
        }
    }

    fn matches(&self, filter: &CredentialFilter) -> bool {
        filter.target.as_ref().map_or(true, ScopeSet::is_empty)
            && filter.matches_fields(
                &self.home_account_id,
                &self.environment,
                &self.client_id,
                &self.realm,
            )
    }

    fn is_kind(&self) -> bool {
        self.credential_type == CredentialType::IdToken
    }
}

/// Access token for one scope set.
///
/// # Example
/// ```
/// use authcache::cache::{AccessTokenEntity, CacheEntity, ScopeSet};
///
/// let entity = AccessTokenEntity::builder()
///     .home_account_id("uid.utid")
///     .environment("login.windows.net")
///     .client_id("client")
///     .realm("tenant")
///     .secret("AT1")
///     .target(ScopeSet::from_scope_string("b a"))
///     .cached_at(1_700_000_000)
///     .expires_on(1_700_003_600)
///     .token_type("Bearer")
///     .build();
/// assert_eq!(
///     entity.cache_key(),
///     "uid.utid-login.windows.net-accesstoken-client-tenant-a b"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenEntity {
    #[builder(into)]
    pub home_account_id: String,
    #[builder(into)]
    pub environment: String,
    #[builder(skip = CredentialType::AccessToken)]
    pub credential_type: CredentialType,
    #[builder(into)]
    pub client_id: String,
    #[builder(into)]
    pub secret: String,
    #[builder(into)]
    pub realm: String,
    pub target: ScopeSet,
    /// Epoch seconds.
    pub cached_at: i64,
    /// Epoch seconds; `None` when the response carried no lifetime.
    pub expires_on: Option<i64>,
    pub extended_expires_on: Option<i64>,
    #[builder(into)]
    pub token_type: String,
}

impl AccessTokenEntity {
    /// Expired, or expiring within `offset_secs` of `now_secs`. Tokens with no
    /// known expiry are never reported expired.
    pub fn is_expired(&self, now_secs: i64, offset_secs: i64) -> bool {
        self.expires_on
            .is_some_and(|expires_on| expires_on <= now_secs.saturating_add(offset_secs))
    }
}

impl CacheEntity for AccessTokenEntity {
    type Key = CredentialKey;
    type Filter = CredentialFilter;

    const KIND: EntityKind = EntityKind::Credential(CredentialType::AccessToken);

    fn key(&self) -> CredentialKey {
        CredentialKey {
            home_account_id: self.home_account_id.clone(),
            environment: self.environment.clone(),
            credential_type: CredentialType::AccessToken,
            client_id: self.client_id.clone(),
            realm: self.realm.clone(),
            target: self.target.print_scopes(),
        }
    }

    fn matches(&self, filter: &CredentialFilter) -> bool {
        filter
            .target
            .as_ref()
            .map_or(true, |scopes| self.target.contains_scope_set(scopes))
            && filter.matches_fields(
                &self.home_account_id,
                &self.environment,
                &self.client_id,
                &self.realm,
            )
    }

    fn is_kind(&self) -> bool {
        self.credential_type == CredentialType::AccessToken
    }
}

/// Realm-agnostic refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenEntity {
    pub home_account_id: String,
    pub environment: String,
    pub credential_type: CredentialType,
    pub client_id: String,
    pub secret: String,
    pub realm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_id: Option<String>,
}

impl RefreshTokenEntity {
    pub fn create(
        home_account_id: &str,
        environment: &str,
        refresh_token: &str,
        client_id: &str,
        family_id: Option<&str>,
    ) -> Self {
        Self {
            home_account_id: home_account_id.to_string(),
            environment: environment.to_string(),
            credential_type: CredentialType::RefreshToken,
            client_id: client_id.to_string(),
            secret: refresh_token.to_string(),
            realm: String::new(),
            family_id: family_id.map(str::to_string),
        }
    }
}

impl CacheEntity for RefreshTokenEntity {
    type Key = CredentialKey;
    type Filter = CredentialFilter;

    const KIND: EntityKind = EntityKind::Credential(CredentialType::RefreshToken);

    fn key(&self) -> CredentialKey {
        CredentialKey {
            home_account_id: self.home_account_id.clone(),
            environment: self.environment.clone(),
            credential_type: CredentialType::RefreshToken,
            client_id: self.client_id.clone(),
            realm: String::new(),
            target: String::new(),
        }
    }

    fn matches(&self, filter: &CredentialFilter) -> bool {
        filter.target.as_ref().map_or(true, ScopeSet::is_empty)
            && filter.matches_fields(
                &self.home_account_id,
                &self.environment,
                &self.client_id,
                &self.realm,
            )
    }

    fn is_kind(&self) -> bool {
        self.credential_type == CredentialType::RefreshToken
    }
}

/// Entities derived from one token response. Never persisted as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheRecord {
    pub account: Option<AccountEntity>,
    pub id_token: Option<IdTokenEntity>,
    pub access_token: Option<AccessTokenEntity>,
    pub refresh_token: Option<RefreshTokenEntity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_key_is_lowercased_and_dash_joined() {
        assert_eq!(
            credential_key(
                "UID.UTID",
                "login.windows.net",
                CredentialType::AccessToken,
                "Client",
                "Tenant",
                "a b"
            ),
            "uid.utid-login.windows.net-accesstoken-client-tenant-a b"
        );
    }

    #[test]
    fn refresh_token_key_has_empty_realm_and_target() {
        let entity = RefreshTokenEntity::create("uid.utid", "login.windows.net", "RT", "client", None);
        assert_eq!(
            entity.cache_key(),
            "uid.utid-login.windows.net-refreshtoken-client--"
        );
    }

    #[test]
    fn access_token_expiry_honours_offset() {
        let entity = AccessTokenEntity::builder()
            .home_account_id("h")
            .environment("e")
            .client_id("c")
            .realm("r")
            .secret("s")
            .target(ScopeSet::from_scope_string("a"))
            .cached_at(1000)
            .expires_on(2000)
            .token_type("Bearer")
            .build();
        assert!(!entity.is_expired(1000, 300));
        assert!(entity.is_expired(1700, 300));
        assert!(entity.is_expired(2001, 0));
    }

    #[test]
    fn unknown_expiry_is_never_expired() {
        let entity = AccessTokenEntity::builder()
            .home_account_id("h")
            .environment("e")
            .client_id("c")
            .realm("r")
            .secret("s")
            .target(ScopeSet::default())
            .cached_at(1000)
            .token_type("Bearer")
            .build();
        assert!(!entity.is_expired(i64::MAX, 0));
    }

    #[test]
    fn access_token_filter_matches_scope_subset() {
        let entity = AccessTokenEntity::builder()
            .home_account_id("h")
            .environment("e")
            .client_id("c")
            .realm("r")
            .secret("s")
            .target(ScopeSet::from_scope_string("openid profile user.read"))
            .cached_at(0)
            .token_type("Bearer")
            .build();
        let mut filter = CredentialFilter::for_account("H", "e");
        assert!(entity.matches(&filter));
        filter.target = Some(ScopeSet::from_scope_string("user.read"));
        assert!(entity.matches(&filter));
        filter.target = Some(ScopeSet::from_scope_string("mail.read"));
        assert!(!entity.matches(&filter));
    }

    #[test]
    fn serialized_credential_uses_camel_case() {
        let entity = IdTokenEntity::create("h", "e", "raw", "c", "r");
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["homeAccountId"], "h");
        assert_eq!(json["credentialType"], "IdToken");
    }
}
