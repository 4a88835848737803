//! Shared fixtures: fake tokens, a seeded trust registry, and in-memory
//! storage.

#![allow(dead_code)]

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};

use authcache::authority::{Authority, TrustRegistry};
use authcache::cache::CacheManager;
use authcache::config::CacheConfig;
use authcache::crypto::DefaultCrypto;
use authcache::response::ResponseHandler;
use authcache::storage::{CacheStorage, StorageHost};

pub const CLIENT_ID: &str = "0813e1d1-ad72-46a9-8665-399bba48c201";
pub const OTHER_CLIENT_ID: &str = "6f4b2a3c-0000-4000-8000-00000000beef";
pub const AUTHORITY: &str = "https://login.microsoftonline.com/common";
pub const TENANT_ID: &str = "3338040d-6c67-4c5b-b112-36a304b66dad";
pub const NOW: i64 = 1_700_000_000;

pub const CLOUD_DISCOVERY_JSON: &str = r#"{
    "metadata": [
        {
            "preferred_network": "login.microsoftonline.com",
            "preferred_cache": "login.windows.net",
            "aliases": ["login.microsoftonline.com", "login.windows.net", "sts.windows.net"]
        },
        {
            "preferred_network": "login.partner.microsoftonline.cn",
            "preferred_cache": "login.partner.microsoftonline.cn",
            "aliases": ["login.partner.microsoftonline.cn", "login.chinacloudapi.cn"]
        }
    ]
}"#;

/// Unsigned JWT carrying `claims`.
pub fn jwt(claims: Value) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

/// ID token issued by the public cloud for a single test user.
pub fn id_token() -> String {
    id_token_from("https://login.microsoftonline.com/3338040d-6c67-4c5b-b112-36a304b66dad/v2.0")
}

pub fn id_token_from(issuer: &str) -> String {
    jwt(json!({
        "iss": issuer,
        "aud": CLIENT_ID,
        "sub": "AAAAAAAAAAAAAAAAAAAAAIkzqFVrSaSaFHy782bbtaQ",
        "oid": "00000000-0000-0000-66f3-3332eca7ea81",
        "tid": TENANT_ID,
        "name": "Abe Lincoln",
        "preferred_username": "AbeLi@microsoft.com",
        "nonce": "123523",
        "iat": NOW,
        "nbf": NOW,
        "exp": NOW + 3600
    }))
}

pub fn client_info(uid: &str, utid: &str) -> String {
    URL_SAFE_NO_PAD.encode(json!({ "uid": uid, "utid": utid }).to_string())
}

pub fn authority() -> Authority {
    Authority::parse(AUTHORITY).unwrap()
}

pub fn seeded_registry() -> Arc<TrustRegistry> {
    let registry = TrustRegistry::offline();
    registry.seed_cloud_discovery_json(CLOUD_DISCOVERY_JSON).unwrap();
    Arc::new(registry)
}

pub fn config(client_id: &str) -> CacheConfig {
    CacheConfig::builder().client_id(client_id).build()
}

pub fn storage_on(host: &StorageHost, client_id: &str) -> CacheStorage {
    CacheStorage::new(&config(client_id), host).unwrap()
}

pub fn handler_on(host: &StorageHost, registry: Arc<TrustRegistry>) -> ResponseHandler {
    ResponseHandler::new(
        CLIENT_ID,
        CacheManager::new(storage_on(host, CLIENT_ID)),
        Arc::new(DefaultCrypto),
        registry,
    )
}
