//! # Shared Bus - In-Process Event Bus
//!
//! Carries notifications between a single node's own components — the
//! mutation interceptor, hash tree, sync engine, connection manager,
//! conflict resolver, and security layer — so they stay decoupled from
//! each other's concrete types.
//!
//! ## Topology
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │  Component A │                    │  Component B │
//! │              │    publish()       │              │
//! │              │ ──────┐            │              │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │  Event Bus   │          │
//!                  │              │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! This bus is strictly in-process; it never crosses the wire. Peer
//! traffic and relay traffic are the sync engine's and connection
//! manager's concern, not this crate's.
//!
//! ## Security
//!
//! - **Time-Bounded Nonce Cache:** available for bus consumers that need
//!   replay protection on their own timestamped payloads.
//! - **Dead Letter Queue:** critical errors are published to a dedicated
//!   topic for investigation rather than silently dropped.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod nonce_cache;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EventFilter, EventTopic, MeshEvent};
pub use nonce_cache::TimeBoundedNonceCache;
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, EventSubscriber, Subscription, SubscriptionError};

/// Current protocol version for event bus messages.
pub const PROTOCOL_VERSION: u16 = 1;

/// Maximum events to buffer per subscriber before backpressure.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Dead Letter Queue topic for failed messages.
pub const DLQ_TOPIC: &str = "dlq.critical";
