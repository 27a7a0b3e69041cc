//! # Content Hashing
//!
//! SHA-256 for every digest that crosses the wire (content hash, bucket
//! hash, root hash — §4.1, §4.2).

use sha2::{Digest, Sha256};

/// SHA-256 hash output (256-bit).
pub type Hash = [u8; 32];

/// Hash a single input with SHA-256.
pub fn sha256_hash(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash the concatenation of two inputs with SHA-256, in order.
///
/// Used to fold a child's hash into its parent bucket (§4.2) without an
/// intermediate allocation beyond the two slices.
pub fn sha256_concat(left: &[u8], right: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hash_deterministic() {
        let h1 = sha256_hash(b"test");
        let h2 = sha256_hash(b"test");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_sha256_different_inputs() {
        let h1 = sha256_hash(b"input1");
        let h2 = sha256_hash(b"input2");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_sha256_concat_order_matters() {
        let a = sha256_concat(b"left", b"right");
        let b = sha256_concat(b"right", b"left");
        assert_ne!(a, b);
    }

    #[test]
    fn test_sha256_concat_matches_manual_hasher() {
        let concat = sha256_concat(b"hello ", b"world");
        let mut hasher = Sha256::new();
        hasher.update(b"hello ");
        hasher.update(b"world");
        let expected: Hash = hasher.finalize().into();
        assert_eq!(concat, expected);
    }
}
