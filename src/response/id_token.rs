use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::crypto::CryptoProvider;
use crate::error::{CacheError, Result};

/// Claims read from an ID token payload. Unknown claims are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdTokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdTokenClaims {
    /// Host of the `iss` claim, lower-cased.
    pub fn issuer_host(&self) -> Option<String> {
        let issuer = self.iss.as_deref()?;
        let url = reqwest::Url::parse(issuer).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        Some(match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        })
    }
}

/// Raw ID token plus its decoded claims. The signature is not verified here.
#[derive(Debug, Clone, PartialEq)]
pub struct IdToken {
    pub raw: String,
    pub claims: IdTokenClaims,
}

impl IdToken {
    pub fn extract(raw: &str, crypto: &dyn CryptoProvider) -> Result<Self> {
        let mut segments = raw.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) if !payload.is_empty() => payload,
            _ => {
                return Err(CacheError::IdTokenParse(
                    "token is not a three-segment JWT".to_string(),
                ))
            }
        };
        let decoded = crypto.base64_decode(payload)?;
        let claims = serde_json::from_str(&decoded)
            .map_err(|e| CacheError::IdTokenParse(format!("invalid claims payload: {e}")))?;
        Ok(Self {
            raw: raw.to_string(),
            claims,
        })
    }
}

/// Decoded `client_info` response field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub utid: String,
}

impl ClientInfo {
    pub fn build(raw: &str, crypto: &dyn CryptoProvider) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(CacheError::ClientInfoDecode("client info is empty".to_string()));
        }
        let decoded = crypto
            .base64_decode(raw)
            .map_err(|e| CacheError::ClientInfoDecode(e.to_string()))?;
        serde_json::from_str(&decoded)
            .map_err(|e| CacheError::ClientInfoDecode(format!("invalid client info: {e}")))
    }

    /// `<uid>.<utid>`
    pub fn home_account_id(&self) -> String {
        format!("{}.{}", self.uid, self.utid)
    }
}
