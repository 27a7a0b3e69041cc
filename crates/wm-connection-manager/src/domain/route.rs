//! Route model: a candidate endpoint for a peer, and its health status.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// How a route was advertised; lower-priority kinds are only tried once the
/// cheaper ones are unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Primary,
    Fallback,
    Remote,
}

/// One candidate endpoint for a peer (§4.4 Route model). `priority` is a
/// tie-break independent of `kind` — lower sorts first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub url: String,
    pub kind: RouteKind,
    pub timeout: Duration,
    pub priority: u8,
}

impl Route {
    #[must_use]
    pub fn new(url: impl Into<String>, kind: RouteKind, timeout: Duration, priority: u8) -> Self {
        Self {
            url: url.into(),
            kind,
            timeout,
            priority,
        }
    }
}

/// Rolling health state for one route, updated by each probe (§4.4 Health check).
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStatus {
    pub available: bool,
    pub last_probe: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub success_count: u64,
    pub failure_count: u64,
    pub rolling_avg_latency: Duration,
}

impl Default for RouteStatus {
    fn default() -> Self {
        Self {
            available: false,
            last_probe: None,
            last_success: None,
            last_failure: None,
            success_count: 0,
            failure_count: 0,
            rolling_avg_latency: Duration::ZERO,
        }
    }
}

impl RouteStatus {
    /// Fold in a successful probe, exponentially smoothing latency so one
    /// slow probe doesn't dominate the average.
    pub fn record_success(&mut self, at: DateTime<Utc>, latency: Duration) {
        self.available = true;
        self.last_probe = Some(at);
        self.last_success = Some(at);
        self.success_count += 1;
        self.rolling_avg_latency = if self.success_count <= 1 {
            latency
        } else {
            smooth(self.rolling_avg_latency, latency)
        };
    }

    pub fn record_failure(&mut self, at: DateTime<Utc>) {
        self.available = false;
        self.last_probe = Some(at);
        self.last_failure = Some(at);
        self.failure_count += 1;
    }
}

/// EWMA with a fixed 0.2 weight on the new sample.
fn smooth(avg: Duration, sample: Duration) -> Duration {
    let avg_ms = avg.as_secs_f64() * 1000.0;
    let sample_ms = sample.as_secs_f64() * 1000.0;
    let blended_ms = avg_ms * 0.8 + sample_ms * 0.2;
    Duration::from_secs_f64((blended_ms / 1000.0).max(0.0))
}

/// A route paired with its current health status, as tracked per peer.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteState {
    pub route: Route,
    pub status: RouteStatus,
}

impl RouteState {
    #[must_use]
    pub fn new(route: Route) -> Self {
        Self {
            route,
            status: RouteStatus::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_sets_average_to_sample() {
        let mut status = RouteStatus::default();
        status.record_success(Utc::now(), Duration::from_millis(40));
        assert_eq!(status.rolling_avg_latency, Duration::from_millis(40));
        assert_eq!(status.success_count, 1);
        assert!(status.available);
    }

    #[test]
    fn failure_marks_unavailable() {
        let mut status = RouteStatus::default();
        status.record_success(Utc::now(), Duration::from_millis(40));
        status.record_failure(Utc::now());
        assert!(!status.available);
        assert_eq!(status.failure_count, 1);
    }
}
