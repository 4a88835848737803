use serde::{Deserialize, Serialize};

use super::id_token::IdTokenClaims;

/// Caller-facing view of a cached account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub home_account_id: String,
    pub environment: String,
    pub tenant_id: String,
    pub username: String,
    pub local_account_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of handling one token response.
///
/// A response without an access token still succeeds: `access_token` is
/// empty, `scopes` is empty and both expiry fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResult {
    pub unique_id: String,
    pub tenant_id: String,
    pub scopes: Vec<String>,
    pub account: Option<AccountInfo>,
    pub id_token: String,
    pub id_token_claims: Option<IdTokenClaims>,
    pub access_token: String,
    pub from_cache: bool,
    /// Epoch seconds.
    pub expires_on: Option<i64>,
    pub ext_expires_on: Option<i64>,
    pub family_id: Option<String>,
    pub state: Option<String>,
}
