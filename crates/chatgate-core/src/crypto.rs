//! Credential cipher: encrypts API keys at rest, decrypts them per call.
//!
//! Stored credentials are `base64(nonce || AES-256-GCM ciphertext)`.
//! Decrypted keys are only ever handed out as [`SecretString`].

use std::sync::Arc;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::config::schema::SecurityConfig;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Errors raised by a [`CredentialCipher`].
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The cipher could not be built (missing or malformed key).
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Ciphertext is corrupt or was produced with another key.
    #[error("decryption failed: {0}")]
    Decryption(String),
}

/// Encrypt/decrypt service for stored credentials.
pub trait CredentialCipher: Send + Sync {
    /// Encrypt a plaintext credential for storage.
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;

    /// Decrypt a stored credential.
    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CryptoError>;
}

// ─────────────────────────────────────────────
// AES-256-GCM
// ─────────────────────────────────────────────

/// AES-256-GCM cipher keyed from configuration.
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Create from raw key bytes (must be 32 bytes).
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "key must be {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Create from a base64-encoded key.
    pub fn from_base64(b64_key: &str) -> Result<Self, CryptoError> {
        let key = STANDARD
            .decode(b64_key.trim())
            .map_err(|e| CryptoError::InvalidKey(format!("invalid base64 key: {e}")))?;
        Self::new(&key)
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CredentialCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend(ciphertext);

        Ok(STANDARD.encode(out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CryptoError> {
        if ciphertext.is_empty() {
            return Ok(SecretString::new(String::new()));
        }

        let data = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CryptoError::Decryption(format!("invalid base64: {e}")))?;
        if data.len() <= NONCE_LEN {
            return Err(CryptoError::Decryption("ciphertext too short".to_string()));
        }

        let (nonce, body) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|e| CryptoError::Decryption(e.to_string()))?;

        String::from_utf8(plaintext)
            .map(SecretString::new)
            .map_err(|e| CryptoError::Decryption(format!("invalid UTF-8: {e}")))
    }
}

// ─────────────────────────────────────────────
// Passthrough (encryption disabled)
// ─────────────────────────────────────────────

/// Stores credentials as-is. Used when `security.encryptionEnabled` is false.
#[derive(Clone, Debug, Default)]
pub struct PassthroughCipher;

impl CredentialCipher for PassthroughCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, ciphertext: &str) -> Result<SecretString, CryptoError> {
        Ok(SecretString::new(ciphertext.to_string()))
    }
}

// ─────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────

/// Generate a fresh base64-encoded AES-256 key.
pub fn generate_key() -> String {
    let mut key = [0u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    STANDARD.encode(key)
}

/// Build the cipher described by the security section of the config.
pub fn cipher_from_config(
    security: &SecurityConfig,
) -> Result<Arc<dyn CredentialCipher>, CryptoError> {
    if !security.encryption_enabled {
        warn!("Credential encryption disabled, API keys are stored in plaintext");
        return Ok(Arc::new(PassthroughCipher));
    }

    let key = security
        .encryption_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            CryptoError::InvalidKey(
                "no encryption key configured (set security.encryptionKey \
                 or CHATGATE_SECURITY__ENCRYPTION_KEY)"
                    .to_string(),
            )
        })?;

    debug!("Using AES-256-GCM credential cipher");
    Ok(Arc::new(AesGcmCipher::from_base64(key)?))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn test_cipher() -> AesGcmCipher {
        AesGcmCipher::new(&[7u8; 32]).unwrap()
    }

    #[test]
    fn test_encrypt_then_decrypt() {
        let cipher = test_cipher();
        let encrypted = cipher.encrypt("sk-test-123").unwrap();

        assert_ne!(encrypted, "sk-test-123");
        assert_eq!(cipher.decrypt(&encrypted).unwrap().expose_secret(), "sk-test-123");
    }

    #[test]
    fn test_nonce_is_random() {
        let cipher = test_cipher();
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_values_pass_through() {
        let cipher = test_cipher();
        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.decrypt("").unwrap().expose_secret(), "");
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let encrypted = test_cipher().encrypt("sk-test").unwrap();
        let other = AesGcmCipher::new(&[8u8; 32]).unwrap();

        assert!(matches!(
            other.decrypt(&encrypted),
            Err(CryptoError::Decryption(_))
        ));
    }

    #[test]
    fn test_decrypt_corrupt_input() {
        let cipher = test_cipher();
        assert!(matches!(
            cipher.decrypt("not base64 !!!"),
            Err(CryptoError::Decryption(_))
        ));
        assert!(matches!(
            cipher.decrypt(&STANDARD.encode([1u8; 4])),
            Err(CryptoError::Decryption(_))
        ));
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(
            AesGcmCipher::new(&[0u8; 16]),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_generated_key_is_usable() {
        let key = generate_key();
        let cipher = AesGcmCipher::from_base64(&key).unwrap();
        let encrypted = cipher.encrypt("hello").unwrap();
        assert_eq!(cipher.decrypt(&encrypted).unwrap().expose_secret(), "hello");
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", test_cipher());
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_cipher_from_config_disabled() {
        let security = SecurityConfig {
            encryption_enabled: false,
            encryption_key: None,
        };
        let cipher = cipher_from_config(&security).unwrap();
        assert_eq!(cipher.decrypt("plain-key").unwrap().expose_secret(), "plain-key");
    }

    #[test]
    fn test_cipher_from_config_missing_key() {
        let security = SecurityConfig {
            encryption_enabled: true,
            encryption_key: None,
        };
        assert!(matches!(
            cipher_from_config(&security),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_cipher_from_config_enabled() {
        let security = SecurityConfig {
            encryption_enabled: true,
            encryption_key: Some(generate_key()),
        };
        let cipher = cipher_from_config(&security).unwrap();
        let encrypted = cipher.encrypt("sk-abc").unwrap();
        assert_ne!(encrypted, "sk-abc");
        assert_eq!(cipher.decrypt(&encrypted).unwrap().expose_secret(), "sk-abc");
    }
}
