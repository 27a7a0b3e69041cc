//! # Rate Limiter
//!
//! Token bucket rate limiter protecting the relay's pull surface and
//! outbound peer calls from cardinality abuse (§6).
//!
//! ## Security
//!
//! Rate limiting prevents:
//! - A single peer flooding the blind relay with pull requests
//! - Resource exhaustion on the mailbox store
//! - Runaway outbound call volume against a misbehaving route

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Token bucket rate limiter.
///
/// # Algorithm
///
/// Uses the token bucket algorithm:
/// - Tokens are added at a fixed rate
/// - Each request consumes one token
/// - Requests are rejected when no tokens available
pub struct RateLimiter {
    /// Maximum tokens in bucket.
    capacity: u64,
    /// Tokens to add per second.
    refill_rate: u64,
    /// Current token count.
    tokens: AtomicU64,
    /// Last refill time.
    last_refill: std::sync::Mutex<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// # Parameters
    ///
    /// - `capacity`: Maximum burst size
    /// - `refill_rate`: Tokens per second
    pub fn new(capacity: u64, refill_rate: u64) -> Self {
        Self {
            capacity,
            refill_rate,
            tokens: AtomicU64::new(capacity),
            last_refill: std::sync::Mutex::new(Instant::now()),
        }
    }

    /// Try to acquire a token.
    ///
    /// Returns `true` if request is allowed, `false` if rate limited.
    pub fn try_acquire(&self) -> bool {
        self.refill();

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }

            if self
                .tokens
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&self) {
        let mut last = self.last_refill.lock().unwrap();
        let now = Instant::now();
        let elapsed = now.duration_since(*last);

        // Calculate tokens to add
        let tokens_to_add = (elapsed.as_secs_f64() * self.refill_rate as f64) as u64;

        if tokens_to_add > 0 {
            *last = now;

            loop {
                let current = self.tokens.load(Ordering::Relaxed);
                let new_value = (current + tokens_to_add).min(self.capacity);

                if self
                    .tokens
                    .compare_exchange(current, new_value, Ordering::SeqCst, Ordering::Relaxed)
                    .is_ok()
                {
                    break;
                }
            }
        }
    }

    /// Get current available tokens.
    pub fn available(&self) -> u64 {
        self.refill();
        self.tokens.load(Ordering::Relaxed)
    }

    /// Check if rate limited without consuming token.
    pub fn is_limited(&self) -> bool {
        self.available() == 0
    }
}

/// Pre-configured rate limiters for the mesh's known call sites.
pub mod presets {
    use super::RateLimiter;

    /// Relay mailbox pulls per claimed peer (10 req/sec, burst 20).
    pub fn relay_pull() -> RateLimiter {
        RateLimiter::new(20, 10)
    }

    /// Hash-tree comparison pulls during a sync pass (100 req/sec, burst 500).
    pub fn hash_tree_pull() -> RateLimiter {
        RateLimiter::new(500, 100)
    }

    /// Relay push submissions per claimed peer (5 req/sec, burst 10).
    pub fn relay_push() -> RateLimiter {
        RateLimiter::new(10, 5)
    }

    /// Connection manager route health probes (50 req/sec, burst 100).
    pub fn route_probe() -> RateLimiter {
        RateLimiter::new(100, 50)
    }
}
