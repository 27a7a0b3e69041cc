//! Concrete driven-port implementations.

pub mod health;
pub mod time;

pub use health::ReqwestRouteProbe;
pub use time::SystemTimeSource;
