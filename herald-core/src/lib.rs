//! # herald-core
//!
//! Core types for the Herald event router.
//!
//! This crate carries no routing logic. It defines what the engine in
//! `herald-std` works with and the seams it uses to reach the host:
//!
//! - **Definitions**: [`EventDefinition`], [`TargetDefinition`] and their
//!   [`CallbackRule`] / [`ThresholdRule`] children, deserialized from
//!   configuration and immutable afterwards.
//! - **Lookup**: [`RouteTable`] with an explicit [`RouteResult::NotFound`],
//!   backed by [`HashMapTable`].
//! - **State**: [`EntityState`] as stored by the host, [`EntitySnapshot`] as
//!   handed to callbacks.
//! - **Host seams**: [`EventBus`], [`StateStore`], [`HostListener`].
//! - **Wire objects**: [`ExternalEnvelope`] and its consumer-side reading
//!   [`EventMessage`].
//!
//! # Error Types
//!
//! - [`HeraldError`] - Top-level error type
//! - [`ConfigError`] - Load-time configuration errors
//! - [`RouteError`] - Per-invocation routing errors
//! - [`AdapterError`] - Payload shaping errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod definition;
mod error;
mod host;
mod message;
mod routing;
mod snapshot;

// Re-exports
pub use definition::{
    CallbackRule, EventDefinition, EventKind, Platform, TargetDefinition, ThresholdRule,
};
pub use error::{AdapterError, BusError, ConfigError, HeraldError, RouteError};
pub use host::{EventBus, Gateway, HostEvent, HostListener, StateStore, Subscription};
pub use message::{
    EntityAction, EntityMessage, EventMessage, EventType, ExternalEnvelope, MessagePlatform,
    OutboundMessage,
};
pub use routing::{HashMapTable, HashMapTableBuilder, RouteResult, RouteTable};
pub use snapshot::{EntitySnapshot, EntityState, GROUP_DOMAIN, domain_of, is_group};
