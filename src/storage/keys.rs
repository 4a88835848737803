//! Cache key naming.
//!
//! Flat keys are namespaced as `<prefix>.<client-id>.<key>` so several client
//! applications can share one physical store. Keys that parse as JSON carry
//! their own schema and are stored verbatim, as are keys already carrying the
//! cache prefix or the legacy ADAL marker.

/// Prefix shared by every namespaced key.
pub const CACHE_PREFIX: &str = "msal";

/// Legacy ADAL ID-token key, stored unprefixed.
pub const ADAL_ID_TOKEN: &str = "adal.idtoken";

/// Keys persisted across requests.
pub mod persistent {
    pub const ID_TOKEN: &str = "idtoken";
    pub const CLIENT_INFO: &str = "client.info";
    pub const ERROR: &str = "error";
    pub const ERROR_DESC: &str = "error.description";
}

/// Keys holding transient request state.
pub mod temporary {
    pub const NONCE_IDTOKEN: &str = "nonce.idtoken";
    pub const REQUEST_STATE: &str = "request.state";
    pub const ORIGIN_URI: &str = "request.origin";
}

/// Keys read from the pre-namespacing schema during migration.
pub const LEGACY_MIGRATION_KEYS: [&str; 4] = [
    persistent::ID_TOKEN,
    persistent::CLIENT_INFO,
    persistent::ERROR,
    persistent::ERROR_DESC,
];

/// How a key is treated before namespacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Well-formed JSON text; used verbatim.
    Structured,
    /// Plain text; subject to namespacing.
    Flat,
}

pub fn classify_key(key: &str) -> KeyClass {
    match serde_json::from_str::<serde_json::Value>(key) {
        Ok(_) => KeyClass::Structured,
        Err(_) => KeyClass::Flat,
    }
}

/// Physical key for `key` under `client_id`.
///
/// Idempotent: a key this function produced is returned unchanged.
pub fn generate_key(client_id: &str, key: &str) -> String {
    if classify_key(key) == KeyClass::Structured {
        return key.to_string();
    }
    if key.starts_with(CACHE_PREFIX) || key.starts_with(ADAL_ID_TOKEN) {
        return key.to_string();
    }
    format!("{CACHE_PREFIX}.{client_id}.{key}")
}

/// Key under which a legacy value was written by the unprefixed schema.
pub fn legacy_key(key: &str) -> String {
    format!("{CACHE_PREFIX}.{key}")
}

/// `<prefix>.<client-id>.`, the namespace owned by one client.
pub fn client_namespace(client_id: &str) -> String {
    format!("{CACHE_PREFIX}.{client_id}.")
}
