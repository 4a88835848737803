//! Error types for authcache.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

/// Primary error type for all cache, storage, and trust operations.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Storage not supported: {0}")]
    StorageUnsupported(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Cache environment {environment} is not trusted by authority {authority}")]
    InvalidCacheEnvironment {
        environment: String,
        authority: String,
    },

    #[error("Metadata discovery failed for {host}: {reason}")]
    DiscoveryFailed { host: String, reason: String },

    #[error("Authority is not trusted: {0}")]
    UntrustedAuthority(String),

    #[error("Invalid authority: {0}")]
    InvalidAuthority(String),

    #[error("ID token parsing error: {0}")]
    IdTokenParse(String),

    #[error("Client info decoding error: {0}")]
    ClientInfoDecode(String),

    #[error("State mismatch: expected {expected}, got {actual}")]
    StateMismatch { expected: String, actual: String },

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl CacheError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StorageUnsupported(_) => "storage_not_supported",
            Self::StorageUnavailable(_) => "no_window_object",
            Self::InvalidCacheEnvironment { .. } => "invalid_cache_environment",
            Self::DiscoveryFailed { .. } => "endpoints_resolution_error",
            Self::UntrustedAuthority(_) => "untrusted_authority",
            Self::InvalidAuthority(_) => "url_parse_error",
            Self::IdTokenParse(_) => "id_token_parsing_error",
            Self::ClientInfoDecode(_) => "client_info_decoding_error",
            Self::StateMismatch { .. } => "state_mismatch",
            Self::Crypto(_) => "crypto_error",
            Self::Configuration(_) => "invalid_configuration",
            Self::Serialization(_) => "serialization_error",
            Self::Io(_) => "io_error",
            Self::Network(_) => "network_error",
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StorageUnsupported(_) | Self::StorageUnavailable(_) => ErrorCategory::Storage,
            Self::InvalidCacheEnvironment { .. }
            | Self::UntrustedAuthority(_)
            | Self::StateMismatch { .. } => ErrorCategory::Trust,
            Self::DiscoveryFailed { .. } => ErrorCategory::Discovery,
            Self::IdTokenParse(_) | Self::ClientInfoDecode(_) | Self::Crypto(_) => {
                ErrorCategory::Decode
            }
            Self::InvalidAuthority(_) | Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Io(_) => ErrorCategory::Io,
            Self::Network(_) => ErrorCategory::Network,
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// Trust and configuration failures are never transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Discovery
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Network | ErrorCategory::Discovery => {
                RecoverySuggestion::RetryWithBackoff
            }
            ErrorCategory::Storage | ErrorCategory::Configuration => {
                RecoverySuggestion::CheckConfiguration
            }
            ErrorCategory::Trust => RecoverySuggestion::RejectToken,
            ErrorCategory::Decode => RecoverySuggestion::Reauthenticate,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

impl From<toml::de::Error> for CacheError {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CacheError>;
