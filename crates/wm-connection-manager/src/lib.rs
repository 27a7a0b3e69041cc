//! Tracks per-peer candidate routes, probes them on a health cycle, and
//! hands the sync engine the best one (§4.4).
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Module Structure
//!
//! ```text
//! wm-connection-manager/
//! ├── domain/    # Route, RouteStatus, the pure select_route rule
//! ├── ports/     # TimeSource, RouteProbe
//! ├── adapters/  # SystemTimeSource, ReqwestRouteProbe
//! └── service/   # ConnectionManager driving API
//! ```

#![allow(missing_docs)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{ConnectionManagerError, Route, RouteKind, RouteState, RouteStatus, RouteSwitchReason};
pub use ports::{ProbeError, RouteProbe, TimeSource};
pub use service::ConnectionManager;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
