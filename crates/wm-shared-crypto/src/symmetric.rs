//! # Symmetric Encryption
//!
//! AES-256-GCM encryption for the blind relay's opaque packet body (§4.6).
//! The relay stores and forwards `nonce || ciphertext`; it never sees a
//! key and cannot distinguish one entity's payload from another's.

use crate::CryptoError;
use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce as AesNonce,
};
use zeroize::Zeroize;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Generates a fresh 96-bit nonce for AES-GCM. Callers persist this
/// alongside the ciphertext; a nonce is never reused under the same key.
pub fn generate_nonce() -> [u8; 12] {
    let mut bytes = [0u8; 12];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    bytes
}

/// Encrypt plaintext with AES-256-GCM.
///
/// Returns `(ciphertext, nonce)`.
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn encrypt(key: &SecretKey, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; 12]), CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = generate_nonce();

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok((ciphertext, nonce))
}

/// Decrypt ciphertext with AES-256-GCM.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if decryption or tag
/// verification fails.
pub fn decrypt(key: &SecretKey, ciphertext: &[u8], nonce: &[u8; 12]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(AesNonce::from_slice(nonce), ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

/// Encrypt with additional authenticated data: `aad` is carried in the
/// clear but tampering with it fails the tag check on decrypt, which is
/// how the blind relay's plaintext header fields (§3) stay authenticated
/// without being part of the secret payload.
///
/// # Errors
///
/// Returns `CryptoError::EncryptionFailed` if encryption fails.
pub fn encrypt_with_aad(
    key: &SecretKey,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, [u8; 12]), CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let nonce = generate_nonce();

    let ciphertext = cipher
        .encrypt(
            AesNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok((ciphertext, nonce))
}

/// Decrypt with the same additional authenticated data passed to
/// [`encrypt_with_aad`]; a mismatched `aad` fails the same way a
/// tampered ciphertext does.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if decryption or tag
/// verification fails.
pub fn decrypt_with_aad(
    key: &SecretKey,
    ciphertext: &[u8],
    nonce: &[u8; 12],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(
            AesNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
