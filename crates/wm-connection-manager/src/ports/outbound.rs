//! Driven ports: a clock the selection rule can be tested against, and the
//! probe that actually dials a route.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::Route;

/// Wall clock, injected so tests can pin timestamps instead of racing the
/// system clock.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Dials one route's health path and reports round-trip latency.
#[async_trait]
pub trait RouteProbe: Send + Sync {
    async fn probe(&self, route: &Route) -> Result<Duration, ProbeError>;
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe to {0} timed out")]
    Timeout(String),
    #[error("probe to {0} failed: {1}")]
    Failed(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTimeSource(DateTime<Utc>);

    impl TimeSource for FixedTimeSource {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn fixed_time_source_returns_configured_value() {
        let at = Utc::now();
        let source = FixedTimeSource(at);
        assert_eq!(source.now(), at);
    }
}
