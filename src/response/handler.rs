use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::authority::{Authority, TrustDecision, TrustRegistry};
use crate::cache::{
    AccessTokenEntity, AccountEntity, CacheManager, CacheRecord, IdTokenEntity,
    RefreshTokenEntity, ScopeSet,
};
use crate::crypto::CryptoProvider;
use crate::error::{CacheError, Result};

use super::id_token::{ClientInfo, IdToken};
use super::result::AuthenticationResult;
use super::token_response::ServerTokenResponse;

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Turns token endpoint responses into cache entries.
///
/// The handler holds no per-response state. The trust check runs against
/// metadata already cached in the [`TrustRegistry`]; resolve the authority
/// before handling its responses.
pub struct ResponseHandler {
    client_id: String,
    cache: CacheManager,
    crypto: Arc<dyn CryptoProvider>,
    registry: Arc<TrustRegistry>,
}

impl ResponseHandler {
    pub fn new(
        client_id: impl Into<String>,
        cache: CacheManager,
        crypto: Arc<dyn CryptoProvider>,
        registry: Arc<TrustRegistry>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            cache,
            crypto,
            registry,
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn registry(&self) -> &TrustRegistry {
        &self.registry
    }

    /// Reject a response whose `state` differs from the one sent with the
    /// request.
    pub fn validate_state(&self, response_state: Option<&str>, request_state: &str) -> Result<()> {
        match response_state {
            Some(state) if state == request_state => Ok(()),
            other => {
                warn!(expected = request_state, "response state mismatch");
                Err(CacheError::StateMismatch {
                    expected: request_state.to_string(),
                    actual: other.unwrap_or_default().to_string(),
                })
            }
        }
    }

    pub fn handle(
        &self,
        response: &ServerTokenResponse,
        authority: &Authority,
    ) -> Result<AuthenticationResult> {
        self.handle_at(response, authority, Utc::now().timestamp())
    }

    /// Handle a response as if received at `now_secs` (epoch seconds).
    ///
    /// Nothing is written unless the token's environment is trusted for
    /// `authority`. Past that check, each entity is written on its own.
    pub fn handle_at(
        &self,
        response: &ServerTokenResponse,
        authority: &Authority,
        now_secs: i64,
    ) -> Result<AuthenticationResult> {
        let id_token = response
            .id_token()
            .map(|raw| IdToken::extract(raw, self.crypto.as_ref()))
            .transpose()?;

        let environment = self.trusted_environment(id_token.as_ref(), authority)?;

        let client_info = response
            .client_info()
            .map(|raw| ClientInfo::build(raw, self.crypto.as_ref()))
            .transpose()?;

        let record = self.build_record(
            response,
            authority,
            &environment,
            id_token.as_ref(),
            client_info.as_ref(),
            now_secs,
        );
        self.cache.save_cache_record(&record)?;
        debug!(
            environment = %environment,
            account = record.account.is_some(),
            id_token = record.id_token.is_some(),
            access_token = record.access_token.is_some(),
            refresh_token = record.refresh_token.is_some(),
            "token response cached"
        );

        Ok(project(&record, id_token.as_ref(), response.state.clone()))
    }

    /// Resolve the environment to cache under, or fail the trust gate.
    fn trusted_environment(&self, id_token: Option<&IdToken>, authority: &Authority) -> Result<String> {
        let candidate = id_token
            .and_then(|token| token.claims.issuer_host())
            .unwrap_or_else(|| authority.host().to_string());

        match self.registry.check(authority, &candidate) {
            TrustDecision::Trusted { environment } => Ok(environment),
            TrustDecision::Untrusted => {
                warn!(
                    environment = %candidate,
                    authority = %authority,
                    "token environment is not an alias of the authority"
                );
                Err(invalid_environment(candidate, authority))
            }
            TrustDecision::Undiscovered => {
                warn!(
                    environment = %candidate,
                    authority = %authority,
                    "authority metadata has not been discovered"
                );
                Err(invalid_environment(candidate, authority))
            }
        }
    }

    fn build_record(
        &self,
        response: &ServerTokenResponse,
        authority: &Authority,
        environment: &str,
        id_token: Option<&IdToken>,
        client_info: Option<&ClientInfo>,
        now_secs: i64,
    ) -> CacheRecord {
        let account = id_token
            .map(|token| {
                AccountEntity::create(
                    client_info,
                    response.client_info(),
                    authority.authority_type(),
                    environment,
                    token,
                )
            })
            .filter(|account| !account.home_account_id.is_empty());

        let home_account_id = account
            .as_ref()
            .map(|account| account.home_account_id.clone())
            .or_else(|| client_info.map(ClientInfo::home_account_id))
            .unwrap_or_default();
        let realm = id_token
            .and_then(|token| token.claims.tid.clone())
            .unwrap_or_else(|| authority.tenant().to_string());

        let id_token_entity = id_token.map(|token| {
            IdTokenEntity::create(
                &home_account_id,
                environment,
                &token.raw,
                &self.client_id,
                &realm,
            )
        });

        let access_token = response.access_token().map(|secret| {
            AccessTokenEntity::builder()
                .home_account_id(home_account_id.as_str())
                .environment(environment)
                .client_id(self.client_id.as_str())
                .secret(secret)
                .realm(realm.as_str())
                .target(ScopeSet::from_scope_string(
                    response.scope.as_deref().unwrap_or_default(),
                ))
                .cached_at(now_secs)
                .maybe_expires_on(
                    response
                        .expires_in
                        .map(|secs| now_secs.saturating_add(secs)),
                )
                .maybe_extended_expires_on(
                    response
                        .ext_expires_in
                        .map(|secs| now_secs.saturating_add(secs)),
                )
                .token_type(
                    response
                        .token_type
                        .as_deref()
                        .unwrap_or(DEFAULT_TOKEN_TYPE),
                )
                .build()
        });

        let refresh_token = response.refresh_token().map(|secret| {
            RefreshTokenEntity::create(
                &home_account_id,
                environment,
                secret,
                &self.client_id,
                response.family_id(),
            )
        });

        CacheRecord {
            account,
            id_token: id_token_entity,
            access_token,
            refresh_token,
        }
    }
}

impl std::fmt::Debug for ResponseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseHandler")
            .field("client_id", &self.client_id)
            .field("cache", &self.cache)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn invalid_environment(environment: String, authority: &Authority) -> CacheError {
    CacheError::InvalidCacheEnvironment {
        environment,
        authority: authority.canonical_authority().to_string(),
    }
}

fn project(
    record: &CacheRecord,
    id_token: Option<&IdToken>,
    state: Option<String>,
) -> AuthenticationResult {
    let claims = id_token.map(|token| &token.claims);
    let access_token = record.access_token.as_ref();

    AuthenticationResult {
        unique_id: claims
            .and_then(|claims| claims.oid.clone().or_else(|| claims.sub.clone()))
            .unwrap_or_default(),
        tenant_id: claims
            .and_then(|claims| claims.tid.clone())
            .unwrap_or_default(),
        scopes: access_token
            .map(|token| token.target.to_vec())
            .unwrap_or_default(),
        account: record.account.as_ref().map(AccountEntity::account_info),
        id_token: id_token.map(|token| token.raw.clone()).unwrap_or_default(),
        id_token_claims: claims.cloned(),
        access_token: access_token
            .map(|token| token.secret.clone())
            .unwrap_or_default(),
        from_cache: false,
        expires_on: access_token.and_then(|token| token.expires_on),
        ext_expires_on: access_token.and_then(|token| token.extended_expires_on),
        family_id: record
            .refresh_token
            .as_ref()
            .and_then(|token| token.family_id.clone()),
        state,
    }
}
