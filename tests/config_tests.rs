//! Tests for cache configuration loading.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use authcache::config::{CacheConfig, CacheLocation, ClearScope};
use authcache::error::CacheError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 6] = [
    "AUTHCACHE_CLIENT_ID",
    "AUTHCACHE_CACHE_LOCATION",
    "AUTHCACHE_STORE_AUTH_STATE_IN_COOKIE",
    "AUTHCACHE_COOKIE_LIFE_DAYS",
    "AUTHCACHE_CLEAR_SCOPE",
    "AUTHCACHE_CACHE_DIR",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn capture(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_config_env() {
    for key in CONFIG_ENV_VARS {
        std::env::remove_var(key);
    }
}

#[test]
fn from_env_reads_every_variable() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_config_env();
    std::env::set_var("AUTHCACHE_CLIENT_ID", "client-from-env");
    std::env::set_var("AUTHCACHE_CACHE_LOCATION", "localStorage");
    std::env::set_var("AUTHCACHE_STORE_AUTH_STATE_IN_COOKIE", "true");
    std::env::set_var("AUTHCACHE_COOKIE_LIFE_DAYS", "7");
    std::env::set_var("AUTHCACHE_CLEAR_SCOPE", "substring");
    std::env::set_var("AUTHCACHE_CACHE_DIR", "/tmp/authcache-env");

    let config = CacheConfig::from_env().unwrap();

    assert_eq!(
        config,
        CacheConfig::builder()
            .client_id("client-from-env")
            .cache_location(CacheLocation::Durable)
            .store_auth_state_in_cookie(true)
            .cookie_life_days(7)
            .clear_scope(ClearScope::LegacySubstring)
            .cache_dir(PathBuf::from("/tmp/authcache-env"))
            .build()
    );
}

#[test]
fn from_env_defaults_optional_variables() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_config_env();
    std::env::set_var("AUTHCACHE_CLIENT_ID", "client");

    let config = CacheConfig::from_env().unwrap();

    assert_eq!(config.cache_location, CacheLocation::Session);
    assert!(!config.store_auth_state_in_cookie);
    assert_eq!(config.cookie_life_days, None);
    assert_eq!(config.clear_scope, ClearScope::ClientPrefix);
    assert_eq!(config.cache_dir, None);
}

#[test]
fn from_env_rejects_unknown_location() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_config_env();
    std::env::set_var("AUTHCACHE_CLIENT_ID", "client");
    std::env::set_var("AUTHCACHE_CACHE_LOCATION", "indexedDB");

    let err = CacheConfig::from_env().unwrap_err();

    assert!(matches!(err, CacheError::StorageUnsupported(ref kind) if kind == "indexedDB"));
}

#[test]
fn from_env_requires_client_id() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_config_env();

    assert!(matches!(
        CacheConfig::from_env(),
        Err(CacheError::Configuration(_))
    ));
}

#[test]
fn from_env_rejects_bad_values() {
    let _lock = env_lock_guard();
    let _guard = EnvGuard::capture(&CONFIG_ENV_VARS);
    clear_config_env();
    std::env::set_var("AUTHCACHE_CLIENT_ID", "client");
    std::env::set_var("AUTHCACHE_COOKIE_LIFE_DAYS", "soon");
    assert!(matches!(
        CacheConfig::from_env(),
        Err(CacheError::Configuration(_))
    ));

    std::env::remove_var("AUTHCACHE_COOKIE_LIFE_DAYS");
    std::env::set_var("AUTHCACHE_STORE_AUTH_STATE_IN_COOKIE", "maybe");
    assert!(matches!(
        CacheConfig::from_env(),
        Err(CacheError::Configuration(_))
    ));
}

#[test]
fn load_from_path_parses_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("authcache.toml");
    std::fs::write(
        &path,
        r#"
client_id = "toml-client"
cache_location = "localStorage"
store_auth_state_in_cookie = true
cookie_life_days = 1
clear_scope = "legacy_substring"
"#,
    )
    .unwrap();

    let config = CacheConfig::load_from_path(&path).unwrap();

    assert_eq!(config.client_id, "toml-client");
    assert_eq!(config.cache_location, CacheLocation::Durable);
    assert!(config.store_auth_state_in_cookie);
    assert_eq!(config.cookie_life_days, Some(1));
    assert_eq!(config.clear_scope, ClearScope::LegacySubstring);
}

#[test]
fn load_from_path_reports_missing_file_and_bad_toml() {
    let temp_dir = TempDir::new().unwrap();
    assert!(matches!(
        CacheConfig::load_from_path(temp_dir.path().join("absent.toml")),
        Err(CacheError::Io(_))
    ));

    let path = temp_dir.path().join("bad.toml");
    std::fs::write(&path, "client_id = ").unwrap();
    assert!(matches!(
        CacheConfig::load_from_path(&path),
        Err(CacheError::Configuration(_))
    ));

    std::fs::write(&path, r#"client_id = "  ""#).unwrap();
    assert!(matches!(
        CacheConfig::load_from_path(&path),
        Err(CacheError::Configuration(_))
    ));
}

#[test]
fn resolved_cache_dir_prefers_explicit_dir() {
    let explicit = CacheConfig::builder()
        .client_id("client")
        .cache_dir(PathBuf::from("/var/cache/app"))
        .build();
    assert_eq!(explicit.resolved_cache_dir(), PathBuf::from("/var/cache/app"));

    let default = CacheConfig::builder().client_id("client").build();
    assert!(default.resolved_cache_dir().ends_with(".authcache"));
}
