//! The three-step decision ladder (§4.5): physical-action override, vector
//! clock dominance, then priority/wall-clock/instance-id tie-breaks for
//! concurrent edits. Pure; no I/O.

use std::time::Duration;

use wm_shared_types::{ClockOrdering, EntityType, PriorityTier};

use super::candidate::{originating_instance, Candidate};

/// Default simultaneity window for the `Equal`-clock timestamp tie-break
/// (§9 Open Question resolution: `resolver.simultaneity_window`).
pub const DEFAULT_SIMULTANEITY_WINDOW: Duration = Duration::from_secs(5);

/// Which rung of the ladder produced the outcome, mirrored onto the
/// `CONFLICTS_AUTO_RESOLVED` metric's `rule` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    PhysicalOverride,
    VectorClock,
    Priority,
    WallClock,
    InstanceId,
}

impl ResolutionStrategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhysicalOverride => "physical_override",
            Self::VectorClock => "vector_clock",
            Self::Priority => "priority",
            Self::WallClock => "wall_clock",
            Self::InstanceId => "instance_id",
        }
    }
}

/// The outcome of running the ladder once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A winner was chosen automatically.
    Resolved {
        strategy: ResolutionStrategy,
        winner_is_incoming: bool,
        winner_instance: String,
        reason: String,
    },
    /// Neither side could be chosen automatically; a human must decide.
    Manual { reason: String },
}

/// Run the ladder for one `(entity_type, existing, incoming)` triple.
///
/// `existing` is this node's current version, `incoming` is the peer's.
#[must_use]
pub fn resolve(
    entity_type: EntityType,
    existing: &Candidate,
    incoming: &Candidate,
) -> Outcome {
    resolve_with_window(entity_type, existing, incoming, DEFAULT_SIMULTANEITY_WINDOW)
}

/// Same as [`resolve`] with an explicit simultaneity window, for tests and
/// hosts that configure `resolver.simultaneity_window` away from the default.
#[must_use]
pub fn resolve_with_window(
    entity_type: EntityType,
    existing: &Candidate,
    incoming: &Candidate,
    simultaneity_window: Duration,
) -> Outcome {
    // Step 1: physical-action override.
    if entity_type.admits_physical_override() {
        let existing_physical = PriorityTier::for_source(existing.source) == PriorityTier::Physical;
        let incoming_physical = PriorityTier::for_source(incoming.source) == PriorityTier::Physical;
        if existing_physical != incoming_physical {
            let winner_is_incoming = incoming_physical;
            let winner_instance = if winner_is_incoming {
                incoming.instance_id.clone()
            } else {
                existing.instance_id.clone()
            };
            return Outcome::Resolved {
                strategy: ResolutionStrategy::PhysicalOverride,
                winner_is_incoming,
                winner_instance,
                reason: "physical_action".to_string(),
            };
        }
    }

    // Step 2: vector clock comparison.
    match existing.vector_clock.compare(&incoming.vector_clock) {
        ClockOrdering::Before => {
            return Outcome::Resolved {
                strategy: ResolutionStrategy::VectorClock,
                winner_is_incoming: true,
                winner_instance: incoming.instance_id.clone(),
                reason: "incoming clock dominates".to_string(),
            };
        }
        ClockOrdering::After => {
            return Outcome::Resolved {
                strategy: ResolutionStrategy::VectorClock,
                winner_is_incoming: false,
                winner_instance: existing.instance_id.clone(),
                reason: "local clock dominates".to_string(),
            };
        }
        ClockOrdering::Equal => {
            let gap = (existing.last_updated - incoming.last_updated)
                .abs()
                .to_std()
                .unwrap_or(Duration::ZERO);
            if gap <= simultaneity_window {
                return Outcome::Manual {
                    reason: "equal clocks within simultaneity window".to_string(),
                };
            }
            return wall_clock_tiebreak(existing, incoming);
        }
        ClockOrdering::Concurrent => {
            let existing_tier = PriorityTier::for_source(existing.source);
            let incoming_tier = PriorityTier::for_source(incoming.source);
            if existing_tier != incoming_tier {
                let winner_is_incoming = incoming_tier > existing_tier;
                let winner_instance = if winner_is_incoming {
                    incoming.instance_id.clone()
                } else {
                    existing.instance_id.clone()
                };
                return Outcome::Resolved {
                    strategy: ResolutionStrategy::Priority,
                    winner_is_incoming,
                    winner_instance,
                    reason: format!(
                        "concurrent edit, priority tier {:?} beats {:?}",
                        incoming_tier.max(existing_tier),
                        incoming_tier.min(existing_tier)
                    ),
                };
            }
            if existing.last_updated != incoming.last_updated {
                return wall_clock_tiebreak(existing, incoming);
            }
            instance_id_tiebreak(existing, incoming)
        }
    }
}

fn wall_clock_tiebreak(existing: &Candidate, incoming: &Candidate) -> Outcome {
    if existing.last_updated == incoming.last_updated {
        return instance_id_tiebreak(existing, incoming);
    }
    let winner_is_incoming = incoming.last_updated > existing.last_updated;
    let winner_instance = if winner_is_incoming {
        incoming.instance_id.clone()
    } else {
        existing.instance_id.clone()
    };
    Outcome::Resolved {
        strategy: ResolutionStrategy::WallClock,
        winner_is_incoming,
        winner_instance,
        reason: "later wall-clock timestamp wins".to_string(),
    }
}

fn instance_id_tiebreak(existing: &Candidate, incoming: &Candidate) -> Outcome {
    let existing_id = originating_instance(existing);
    let incoming_id = originating_instance(incoming);
    let winner_is_incoming = incoming_id < existing_id;
    let winner_instance = if winner_is_incoming {
        incoming_id.to_string()
    } else {
        existing_id.to_string()
    };
    Outcome::Resolved {
        strategy: ResolutionStrategy::InstanceId,
        winner_is_incoming,
        winner_instance,
        reason: "deterministic instance-id tiebreak".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wm_shared_types::{Source, VectorClock};

    fn candidate(instance_id: &str, source: Source, vc: VectorClock) -> Candidate {
        Candidate {
            instance_id: instance_id.to_string(),
            vector_clock: vc,
            source,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn physical_override_wins_when_only_one_side_is_physical() {
        let existing = candidate("node-a", Source::WebServer, VectorClock::new());
        let incoming = candidate("node-b", Source::Pda, VectorClock::new());
        let outcome = resolve(EntityType::Quants, &existing, &incoming);
        assert_eq!(
            outcome,
            Outcome::Resolved {
                strategy: ResolutionStrategy::PhysicalOverride,
                winner_is_incoming: true,
                winner_instance: "node-b".to_string(),
                reason: "physical_action".to_string(),
            }
        );
    }

    #[test]
    fn physical_override_does_not_apply_to_entity_types_without_it() {
        let mut incoming_clock = VectorClock::new();
        incoming_clock.advance("node-b", &VectorClock::new());
        let existing = candidate("node-a", Source::WebServer, VectorClock::new());
        let incoming = candidate("node-b", Source::Pda, incoming_clock);
        let outcome = resolve(EntityType::Partners, &existing, &incoming);
        assert_eq!(
            outcome,
            Outcome::Resolved {
                strategy: ResolutionStrategy::VectorClock,
                winner_is_incoming: true,
                winner_instance: "node-b".to_string(),
                reason: "incoming clock dominates".to_string(),
            }
        );
    }

    #[test]
    fn before_clock_means_incoming_wins() {
        let mut incoming_clock = VectorClock::new();
        incoming_clock.advance("node-b", &VectorClock::new());
        let existing = candidate("node-a", Source::LocalServer, VectorClock::new());
        let incoming = candidate("node-b", Source::LocalServer, incoming_clock);
        let outcome = resolve(EntityType::Products, &existing, &incoming);
        assert!(matches!(
            outcome,
            Outcome::Resolved { strategy: ResolutionStrategy::VectorClock, winner_is_incoming: true, .. }
        ));
    }

    #[test]
    fn concurrent_edit_uses_priority_tier() {
        let mut existing_clock = VectorClock::new();
        existing_clock.advance("node-a", &VectorClock::new());
        let mut incoming_clock = VectorClock::new();
        incoming_clock.advance("node-b", &VectorClock::new());
        let existing = candidate("node-a", Source::WebServer, existing_clock);
        let incoming = candidate("node-b", Source::Pda, incoming_clock);
        let outcome = resolve(EntityType::Products, &existing, &incoming);
        assert_eq!(
            outcome,
            Outcome::Resolved {
                strategy: ResolutionStrategy::Priority,
                winner_is_incoming: true,
                winner_instance: "node-b".to_string(),
                reason: "concurrent edit, priority tier Physical beats Regional".to_string(),
            }
        );
    }

    #[test]
    fn equal_clocks_within_window_go_to_manual() {
        let existing = candidate("node-a", Source::LocalServer, VectorClock::new());
        let incoming = candidate("node-b", Source::LocalServer, VectorClock::new());
        let outcome = resolve(EntityType::Products, &existing, &incoming);
        assert_eq!(
            outcome,
            Outcome::Manual {
                reason: "equal clocks within simultaneity window".to_string(),
            }
        );
    }

    #[test]
    fn equal_clocks_outside_window_fall_to_wall_clock() {
        let mut existing = candidate("node-a", Source::LocalServer, VectorClock::new());
        let mut incoming = candidate("node-b", Source::LocalServer, VectorClock::new());
        existing.last_updated = Utc::now() - chrono::Duration::seconds(30);
        incoming.last_updated = Utc::now();
        let outcome = resolve(EntityType::Products, &existing, &incoming);
        assert_eq!(
            outcome,
            Outcome::Resolved {
                strategy: ResolutionStrategy::WallClock,
                winner_is_incoming: true,
                winner_instance: "node-b".to_string(),
                reason: "later wall-clock timestamp wins".to_string(),
            }
        );
    }

    #[test]
    fn concurrent_tied_priority_and_wall_clock_falls_to_instance_id() {
        let mut existing_clock = VectorClock::new();
        existing_clock.advance("node-b", &VectorClock::new());
        let mut incoming_clock = VectorClock::new();
        incoming_clock.advance("node-a", &VectorClock::new());

        let at = Utc::now();
        let mut existing = candidate("node-b", Source::LocalServer, existing_clock);
        let mut incoming = candidate("node-a", Source::LocalServer, incoming_clock);
        existing.last_updated = at;
        incoming.last_updated = at;

        let outcome = resolve(EntityType::Products, &existing, &incoming);
        assert_eq!(
            outcome,
            Outcome::Resolved {
                strategy: ResolutionStrategy::InstanceId,
                winner_is_incoming: true,
                winner_instance: "node-a".to_string(),
                reason: "deterministic instance-id tiebreak".to_string(),
            }
        );
    }
}
