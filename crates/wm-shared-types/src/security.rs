//! # Mesh Bearer-Token Security Module
//!
//! The **single, authoritative implementation** of peer HTTP surface
//! authentication (§6): a short-lived bearer token signed with the
//! mesh-wide secret, `exp <= 1h`, replay-protected by nonce.
//!
//! ## Security Properties
//!
//! - **HMAC-SHA256 Signatures**: tokens are signed with the mesh-wide secret.
//! - **Time-Bounded Validity**: tokens expire at `exp`; issuance is rejected
//!   past `MeshHandshakeToken::MAX_LIFETIME_SECS`.
//! - **Nonce Replay Prevention**: each nonce is valid only once within the
//!   cache's retention window.

use crate::envelope::{MeshHandshakeToken, TokenVerification};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Duration to retain nonces in cache (2x a token's max lifetime is
/// overkill for replay prevention purposes; one token lifetime is enough
/// since an expired token is rejected on the `exp` check regardless).
pub const NONCE_CACHE_TTL: Duration = Duration::from_secs(MeshHandshakeToken::MAX_LIFETIME_SECS);

/// Maximum nonce cache size before forced cleanup.
pub const MAX_NONCE_CACHE_SIZE: usize = 100_000;

// =============================================================================
// NONCE CACHE
// =============================================================================

/// Thread-safe nonce cache for replay prevention.
///
/// - Uses a `HashMap<Uuid, Instant>` to track seen nonces and their expiry.
/// - Automatically evicts expired nonces when the cache grows too large.
/// - Bounded to prevent memory exhaustion attacks.
#[derive(Debug)]
pub struct NonceCache {
    cache: RwLock<HashMap<Uuid, Instant>>,
}

impl NonceCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Checks if a nonce has been seen before; if not, inserts it.
    ///
    /// Returns `true` if the nonce is fresh, `false` if it is a replay.
    pub fn check_and_insert(&self, nonce: Uuid) -> bool {
        let now = Instant::now();
        let expiry = now + NONCE_CACHE_TTL;

        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if cache.len() >= MAX_NONCE_CACHE_SIZE {
            cache.retain(|_, exp| *exp > now);
        }

        if let Some(&exp) = cache.get(&nonce) {
            if exp > now {
                return false;
            }
        }

        cache.insert(nonce, expiry);
        true
    }

    /// Clears all cached nonces. Primarily for testing.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NonceCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HMAC SIGNING
// =============================================================================

/// Signs a canonically-serialized token with HMAC-SHA256, returning the
/// raw 32-byte tag.
///
/// # Panics
///
/// Never: `HmacSha256` accepts a key of any length.
#[must_use]
pub fn sign_bytes(message_bytes: &[u8], mesh_secret: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(mesh_secret).expect("HMAC accepts any key length");
    mac.update(message_bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Validates an HMAC-SHA256 tag in constant time.
#[must_use]
pub fn verify_bytes(message_bytes: &[u8], tag: &[u8; 32], mesh_secret: &[u8]) -> bool {
    let mut mac = match HmacSha256::new_from_slice(mesh_secret) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(message_bytes);
    mac.verify_slice(tag).is_ok()
}

// =============================================================================
// TOKEN VERIFICATION
// =============================================================================

/// Returns the current Unix timestamp, or 0 if the system clock is
/// somehow before the epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Verifies a `MeshHandshakeToken` end to end: token type, expiry, replay,
/// signature — the single entry point every `/mesh/*` handler uses.
///
/// `canonical_bytes` must be the same canonical serialization the issuer
/// signed (typically `serde_json::to_vec` of the claims with `signature`
/// excluded).
pub fn verify_token(
    token: &MeshHandshakeToken,
    canonical_bytes: &[u8],
    signature: &[u8; 32],
    nonce_cache: &NonceCache,
    mesh_secret: &[u8],
) -> TokenVerification {
    if token.token_type != MeshHandshakeToken::TOKEN_TYPE {
        return TokenVerification::WrongTokenType {
            received: token.token_type.clone(),
        };
    }

    let now = current_timestamp();
    if token.is_expired(now) {
        return TokenVerification::Expired {
            exp: token.exp,
            now,
        };
    }

    if !nonce_cache.check_and_insert(token.nonce) {
        return TokenVerification::ReplayDetected {
            nonce: token.nonce,
        };
    }

    if !verify_bytes(canonical_bytes, signature, mesh_secret) {
        return TokenVerification::InvalidSignature;
    }

    TokenVerification::Valid
}
