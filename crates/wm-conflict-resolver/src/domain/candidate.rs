//! The per-side inputs the decision ladder needs (§4.5 Inputs).

use chrono::{DateTime, Utc};
use wm_shared_types::{Source, VectorClock};

/// One side of a conflict: a record version plus everything the ladder
/// needs to judge it.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub instance_id: String,
    pub vector_clock: VectorClock,
    pub source: Source,
    pub last_updated: DateTime<Utc>,
}

/// The instance id that most recently advanced this clock — `advance`
/// always increments the mutator's own component last, so the entry with
/// the highest version is that side's originating node. Ties (an empty or
/// freshly-initialized clock) fall back to the candidate's own `instance_id`.
#[must_use]
pub fn originating_instance(candidate: &Candidate) -> &str {
    candidate
        .vector_clock
        .entries()
        .max_by(|(id_a, version_a), (id_b, version_b)| {
            version_a.cmp(version_b).then(id_b.cmp(id_a))
        })
        .map(|(id, _)| id)
        .unwrap_or(candidate.instance_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(instance_id: &str, mut clock: VectorClock) -> Candidate {
        clock.advance(instance_id, &VectorClock::new());
        Candidate {
            instance_id: instance_id.to_string(),
            vector_clock: clock,
            source: Source::LocalServer,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn originating_instance_is_the_last_advancer() {
        let c = candidate("node-a", VectorClock::new());
        assert_eq!(originating_instance(&c), "node-a");
    }

    #[test]
    fn tie_breaks_to_smaller_instance_id() {
        // node-b advances to version 1, then node-a advances taking that as
        // its predecessor, landing both instances at version 1.
        let mut predecessor = VectorClock::new();
        predecessor.advance("node-b", &VectorClock::new());
        let mut tied = VectorClock::new();
        tied.advance("node-a", &predecessor);

        let c = Candidate {
            instance_id: "node-a".to_string(),
            vector_clock: tied,
            source: Source::LocalServer,
            last_updated: Utc::now(),
        };
        assert_eq!(originating_instance(&c), "node-a");
    }
}
