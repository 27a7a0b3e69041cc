//! Driven ports the connection manager needs from its host.

pub mod outbound;

pub use outbound::{ProbeError, RouteProbe, TimeSource};
