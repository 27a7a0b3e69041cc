//! Seals and opens `EncryptedPacket`s (§4.6): the payload is AES-256-GCM
//! ciphertext, the header travels in the clear but is bound into the AEAD
//! tag as additional authenticated data so a relay can index on it without
//! being able to tamper with it undetected.

use wm_shared_crypto::{decrypt_with_aad, encrypt_with_aad, SecretKey};
use wm_shared_types::{EntityId, EntityType, PacketHeader, VectorClock};

use super::errors::CryptoError;

/// The only algorithm identifier this crate currently writes into
/// `PacketHeader::algorithm`. Kept as a named constant rather than a
/// hardcoded literal so a future algorithm addition has one call site.
pub const ALGORITHM: &str = "AES-256-GCM";

/// Encrypts `payload` and wraps it with a plaintext header, binding the
/// header into the AEAD tag via `aad`.
///
/// # Errors
///
/// Returns [`CryptoError::HeaderEncoding`] if the header can't be
/// canonically serialized, or [`CryptoError::Aead`] if encryption fails.
#[allow(clippy::too_many_arguments)]
pub fn seal(
    entity_type: EntityType,
    entity_id: EntityId,
    version: u64,
    source_instance: String,
    vector_clock: VectorClock,
    key_id: String,
    key: &SecretKey,
    payload: &[u8],
) -> Result<wm_shared_types::EncryptedPacket, CryptoError> {
    let header = PacketHeader {
        entity_type,
        entity_id,
        version,
        source_instance,
        vector_clock,
        key_id,
        algorithm: ALGORITHM.to_string(),
    };
    let aad = header_aad(&header)?;
    let (ciphertext, nonce) = encrypt_with_aad(key, payload, &aad)?;

    Ok(wm_shared_types::EncryptedPacket {
        header,
        nonce: nonce.to_vec(),
        ciphertext,
    })
}

/// Decrypts `packet` under `key`, re-deriving the same AAD from its
/// (already-trusted-as-read) header. A tampered header or a wrong key both
/// surface as [`CryptoError::Aead`].
///
/// # Errors
///
/// Returns [`CryptoError::MalformedNonce`] if the stored nonce isn't 12
/// bytes, or [`CryptoError::Aead`] if the tag check fails.
pub fn open(
    packet: &wm_shared_types::EncryptedPacket,
    key: &SecretKey,
) -> Result<Vec<u8>, CryptoError> {
    let nonce: [u8; 12] = packet
        .nonce
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::MalformedNonce)?;
    let aad = header_aad(&packet.header)?;

    Ok(decrypt_with_aad(key, &packet.ciphertext, &nonce, &aad)?)
}

/// The header's canonical JSON encoding, used as AAD on both sides of a
/// seal/open pair. This only needs to be stable for one process's own
/// round trip, not across peers, since each peer derives its own AAD from
/// the header it already holds in the clear.
fn header_aad(header: &PacketHeader) -> Result<Vec<u8>, CryptoError> {
    serde_json::to_vec(header).map_err(|e| CryptoError::HeaderEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(instance_id: &str) -> VectorClock {
        let mut vc = VectorClock::new();
        vc.advance(instance_id, &VectorClock::new());
        vc
    }

    #[test]
    fn seal_then_open_recovers_payload() {
        let key = SecretKey::generate();
        let packet = seal(
            EntityType::Quants,
            "q-1".to_string(),
            3,
            "node-a".to_string(),
            clock("node-a"),
            "k-1".to_string(),
            &key,
            b"{\"qty\":5}",
        )
        .unwrap();

        let opened = open(&packet, &key).unwrap();
        assert_eq!(opened, b"{\"qty\":5}");
        assert_eq!(packet.header.algorithm, ALGORITHM);
    }

    #[test]
    fn tampered_header_fails_open() {
        let key = SecretKey::generate();
        let mut packet = seal(
            EntityType::Quants,
            "q-1".to_string(),
            3,
            "node-a".to_string(),
            clock("node-a"),
            "k-1".to_string(),
            &key,
            b"payload",
        )
        .unwrap();

        packet.header.version = 4;
        assert!(open(&packet, &key).is_err());
    }

    #[test]
    fn wrong_key_fails_open() {
        let key = SecretKey::generate();
        let other = SecretKey::generate();
        let packet = seal(
            EntityType::Quants,
            "q-1".to_string(),
            3,
            "node-a".to_string(),
            clock("node-a"),
            "k-1".to_string(),
            &key,
            b"payload",
        )
        .unwrap();

        assert!(open(&packet, &other).is_err());
    }
}
