//! Structured logging helpers shared across node components.
//!
//! Logs are formatted as JSON with consistent fields when
//! `TelemetryConfig::json_logs` is set:
//! - `timestamp`: ISO 8601 timestamp
//! - `level`: log level (trace, debug, info, warn, error)
//! - `component`: emitting component (sync_engine, connection_manager, ...)
//! - `message`: log message
//! - additional context fields per call site

use crate::{TelemetryConfig, TelemetryError};

/// Structured logger handle.
pub struct StructuredLogger {
    _initialized: bool,
}

/// No-op placeholder kept for symmetry with `init_tracing` — structured
/// logging is already configured by the `tracing-subscriber` layer built
/// in `tracing_setup`; this exists so callers have one `TelemetryGuard`
/// shape to hold regardless of how many sinks are wired up later.
pub fn init_logging(_config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    Ok(StructuredLogger { _initialized: true })
}

/// Helper to create structured log entries with a consistent `component` field.
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(component = $component, $($($field)*,)? $msg)
    };
    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(component = $component, $($($field)*,)? $msg)
    };
    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(component = $component, $($($field)*,)? $msg)
    };
    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(component = $component, $($($field)*,)? $msg)
    };
}

/// Log an entity-mutation event with standard fields.
#[macro_export]
macro_rules! log_entity_event {
    ($level:ident, $component:expr, $msg:expr, $entity_type:expr, $entity_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            entity_type = %$entity_type,
            entity_id = %$entity_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a peer-related event with standard fields.
#[macro_export]
macro_rules! log_peer_event {
    ($level:ident, $component:expr, $msg:expr, $peer_instance_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = $component,
            peer_instance_id = %$peer_instance_id,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_returns_initialized_handle() {
        let config = TelemetryConfig::default();
        let logger = init_logging(&config).unwrap();
        assert!(logger._initialized);
    }
}
