//! Injected cryptographic capability.
//!
//! The cache core never generates randomness or decodes token material on its
//! own; it calls through a [`CryptoProvider`] supplied by the host.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::{CacheError, Result};

/// PKCE verifier and its S256 challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceCodes {
    pub verifier: String,
    pub challenge: String,
}

/// Crypto operations consumed by the cache core.
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    fn create_new_guid(&self) -> String;

    /// Encode text as unpadded base64url.
    fn base64_encode(&self, input: &str) -> String;

    /// Decode base64url (padded or not) into UTF-8 text.
    fn base64_decode(&self, input: &str) -> Result<String>;

    async fn generate_pkce_codes(&self) -> Result<PkceCodes>;
}

/// Default provider built on `uuid`, `base64`, and `sha2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCrypto;

impl DefaultCrypto {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CryptoProvider for DefaultCrypto {
    fn create_new_guid(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn base64_encode(&self, input: &str) -> String {
        URL_SAFE_NO_PAD.encode(input.as_bytes())
    }

    fn base64_decode(&self, input: &str) -> Result<String> {
        let normalized: String = input
            .trim_end_matches('=')
            .chars()
            .map(|ch| match ch {
                '+' => '-',
                '/' => '_',
                other => other,
            })
            .collect();
        let bytes = URL_SAFE_NO_PAD
            .decode(normalized.as_bytes())
            .map_err(|e| CacheError::Crypto(format!("invalid base64 input: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| CacheError::Crypto(format!("decoded base64 is not UTF-8: {e}")))
    }

    async fn generate_pkce_codes(&self) -> Result<PkceCodes> {
        let verifier = generate_code_verifier();
        let challenge = compute_code_challenge(&verifier);
        Ok(PkceCodes {
            verifier,
            challenge,
        })
    }
}

fn generate_code_verifier() -> String {
    let mut buf = [0u8; 32];
    for chunk in buf.chunks_mut(16) {
        let id = uuid::Uuid::new_v4();
        let bytes = id.as_bytes();
        let len = chunk.len().min(16);
        chunk[..len].copy_from_slice(&bytes[..len]);
    }
    URL_SAFE_NO_PAD.encode(buf)
}

fn compute_code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trips_text() {
        let crypto = DefaultCrypto::new();
        let encoded = crypto.base64_encode(r#"{"uid":"123","utid":"456"}"#);
        assert!(!encoded.contains('='));
        assert_eq!(
            crypto.base64_decode(&encoded).unwrap(),
            r#"{"uid":"123","utid":"456"}"#
        );
    }

    #[test]
    fn base64_decode_accepts_padded_standard_alphabet() {
        let crypto = DefaultCrypto::new();
        // "subjects?" encodes to "c3ViamVjdHM/" in the standard alphabet.
        assert_eq!(crypto.base64_decode("c3ViamVjdHM/").unwrap(), "subjects?");
        assert_eq!(crypto.base64_decode("YQ==").unwrap(), "a");
    }

    #[test]
    fn base64_decode_rejects_garbage() {
        let crypto = DefaultCrypto::new();
        assert!(matches!(
            crypto.base64_decode("!!not base64!!"),
            Err(CacheError::Crypto(_))
        ));
    }

    #[test]
    fn code_challenge_matches_rfc7636_vector() {
        assert_eq!(
            compute_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[tokio::test]
    async fn pkce_codes_are_fresh_and_consistent() {
        let crypto = DefaultCrypto::new();
        let first = crypto.generate_pkce_codes().await.unwrap();
        let second = crypto.generate_pkce_codes().await.unwrap();
        assert_ne!(first.verifier, second.verifier);
        assert_eq!(first.verifier.len(), 43);
        assert_eq!(first.challenge, compute_code_challenge(&first.verifier));
    }

    #[test]
    fn guids_are_unique() {
        let crypto = DefaultCrypto::new();
        assert_ne!(crypto.create_new_guid(), crypto.create_new_guid());
    }
}
