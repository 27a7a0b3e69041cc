//! # Mesh Events
//!
//! Defines all event types that flow through the in-process bus. These are
//! internal notifications between a node's own components (mutation
//! interceptor, sync engine, connection manager); they never cross the
//! wire themselves.

use serde::{Deserialize, Serialize};
use wm_shared_types::{ChecksumRow, EntityKey, EntityType};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MeshEvent {
    /// A mutation was intercepted and its checksum row recomputed.
    MutationIndexed {
        key: EntityKey,
        row: ChecksumRow,
    },

    /// An ancestor bucket's hash changed as a result of a child update.
    BucketHashChanged {
        bucket: char,
        new_hash: String,
    },

    /// The two-level tree's root hash changed.
    RootHashChanged { new_root: String },

    /// A sync pass against a peer started.
    SyncStarted { peer_instance_id: String },

    /// A sync pass against a peer finished.
    SyncCompleted {
        peer_instance_id: String,
        entities_pulled: u64,
        entities_pushed: u64,
    },

    /// A sync pass against a peer failed.
    SyncFailed {
        peer_instance_id: String,
        reason: String,
    },

    /// The connection manager switched the active route for a peer.
    RouteSwitched {
        peer_instance_id: String,
        from: Option<String>,
        to: String,
        reason: String,
    },

    /// A conflict between two versions of an entity was resolved.
    ConflictResolved {
        key: EntityKey,
        winner_instance: String,
        reason: String,
    },

    /// A conflict could not be resolved automatically and was queued for
    /// manual review.
    ConflictQueuedForReview { key: EntityKey },

    /// A packet was deposited into the blind relay's mailbox.
    RelayDeposit {
        recipient_instance_id: String,
        entity_type: EntityType,
    },

    /// Critical error requiring operator attention.
    CriticalError {
        component: &'static str,
        error: String,
    },
}

impl MeshEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::MutationIndexed { .. }
            | Self::BucketHashChanged { .. }
            | Self::RootHashChanged { .. } => EventTopic::MutationInterception,
            Self::SyncStarted { .. } | Self::SyncCompleted { .. } | Self::SyncFailed { .. } => {
                EventTopic::SyncEngine
            }
            Self::RouteSwitched { .. } => EventTopic::ConnectionManager,
            Self::ConflictResolved { .. } | Self::ConflictQueuedForReview { .. } => {
                EventTopic::ConflictResolution
            }
            Self::RelayDeposit { .. } => EventTopic::SecurityLayer,
            Self::CriticalError { .. } => EventTopic::DeadLetterQueue,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    MutationInterception,
    SyncEngine,
    ConnectionManager,
    ConflictResolution,
    SecurityLayer,
    /// Dead Letter Queue for critical errors.
    DeadLetterQueue,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &MeshEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
