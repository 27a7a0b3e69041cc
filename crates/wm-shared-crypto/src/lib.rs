//! # Shared Crypto
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Content/bucket/root hashing (§4.1, §4.2) |
//! | `symmetric` | AES-256-GCM | Blind-relay packet AEAD (§4.6) |
//!
//! ## Security Properties
//!
//! - **AES-256-GCM**: 96-bit nonce, one nonce per encryption, never reused
//!   under the same key.
//! - **SHA-256**: used for the canonical content/bucket/root digests that
//!   travel over the wire, since every peer must derive byte-identical
//!   values regardless of platform.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod symmetric;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha256_concat, sha256_hash};
pub use symmetric::{decrypt, decrypt_with_aad, encrypt, encrypt_with_aad, SecretKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
