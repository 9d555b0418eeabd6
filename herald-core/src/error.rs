//! Error types for Herald.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`HeraldError`] - Top-level error type
//! - [`ConfigError`] - Malformed configuration, fatal at load time
//! - [`RouteError`] - Per-invocation routing failures
//! - [`AdapterError`] - Payload shaping failures, never escape an adapter
//! - [`BusError`] - Host bus transport failures

use thiserror::Error;

/// Top-level error type for all Herald operations.
#[derive(Error, Debug)]
pub enum HeraldError {
    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An inbound event could not be routed.
    #[error("routing error: {0}")]
    Route(#[from] RouteError),

    /// The host bus refused an operation.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),
}

/// Errors raised while loading event and target definitions.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration document is not valid JSON or misses a required key.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A required field is present but empty.
    #[error("{context}: field `{field}` must not be empty")]
    EmptyField {
        /// Where the field was found, e.g. `event "TEMP_HIGH" callback #0`.
        context: String,
        /// The offending field name as written in configuration.
        field: &'static str,
    },
}

/// Errors surfaced for a single routed invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// A declared listener fired but has no definition in the address book.
    #[error("event [{0}] not found in the address book")]
    UnknownEvent(String),

    /// The system identity entity is absent from the state store.
    #[error("system identity entity [{0}] has no state")]
    MissingSystemIdentity(String),

    /// Re-entrant dispatch went deeper than the configured limit.
    #[error("dispatch depth limit {limit} exceeded while handling [{event}]")]
    DepthExceeded {
        /// The event that would have exceeded the limit.
        event: String,
        /// The configured maximum depth.
        limit: usize,
    },

    /// Publishing on the host bus failed.
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Errors raised while shaping a platform payload.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The target data lacks a field the adapter requires.
    #[error("target data has no `{0}` field")]
    MissingField(&'static str),

    /// A value expected to be a JSON object was something else.
    #[error("`{0}` is not an object")]
    NotAnObject(&'static str),

    /// The system identity could not be resolved.
    #[error(transparent)]
    Identity(#[from] RouteError),

    /// The envelope could not be serialized.
    #[error("cannot serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A side-effecting adapter failed to publish.
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Errors returned by a host bus.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus no longer accepts events.
    #[error("bus has been closed")]
    Closed,

    /// The bus rejected the event.
    #[error("bus rejected event: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_display() {
        let err = RouteError::DepthExceeded {
            event: "A".to_string(),
            limit: 4,
        };
        assert_eq!(
            err.to_string(),
            "dispatch depth limit 4 exceeded while handling [A]"
        );

        let err = RouteError::from(BusError::Closed);
        assert_eq!(err.to_string(), "bus has been closed");
    }

    #[test]
    fn test_config_error_names_the_field() {
        let err = ConfigError::EmptyField {
            context: "event \"TEMP_HIGH\" callback #0".to_string(),
            field: "event",
        };
        assert_eq!(
            err.to_string(),
            "event \"TEMP_HIGH\" callback #0: field `event` must not be empty"
        );
    }
}
