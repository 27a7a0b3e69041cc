//! Route model and the pure selection rule; no I/O. Health probing and the
//! driving API live in `adapters`/`service`.

pub mod errors;
pub mod route;
pub mod selection;

pub use errors::ConnectionManagerError;
pub use route::{Route, RouteKind, RouteState, RouteStatus};
pub use selection::{select_route, RouteSwitchReason, SelectionOutcome};
