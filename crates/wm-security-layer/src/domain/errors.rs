//! Error taxonomy for packet sealing and key lookup (§7).

use wm_shared_crypto::CryptoError as AeadError;

/// Errors from sealing, opening or rotating keys for blind-relay packets.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("aead failure: {0}")]
    Aead(#[from] AeadError),

    #[error("packet nonce is not 12 bytes")]
    MalformedNonce,

    #[error("failed to encode packet header for AAD binding: {0}")]
    HeaderEncoding(String),

    #[error("no key in history matches key_id {0:?} or decrypts the packet")]
    KeyExhausted(String),
}
