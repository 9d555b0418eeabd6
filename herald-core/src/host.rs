//! Seams to the host environment.
//!
//! The router never owns a transport or a state database. It talks to the
//! host through two traits:
//!
//! - [`EventBus`] - publish events, register subscriptions
//! - [`StateStore`] - read live entity state
//!
//! and is itself delivered events through [`HostListener`].

use crate::{
    error::{BusError, RouteError},
    snapshot::EntityState,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Weak;

/// An event travelling on the host bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    /// Event name.
    pub event_type: String,
    /// Event payload.
    #[serde(default)]
    pub data: Value,
}

impl HostEvent {
    /// Create a new host event.
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// A top-level string field of the payload.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// The entry point an event is delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gateway {
    /// Generic manual trigger: re-emit or threshold lookup.
    ManualTrigger,
    /// A configured listener event.
    Listener,
    /// A script finished running.
    ScriptCompletion,
}

/// Receives events from the host bus.
pub trait HostListener: Send + Sync {
    /// Handle one delivered event. Errors are reported to the host, never
    /// propagated to the publisher.
    fn on_host_event(&self, gateway: Gateway, event: &HostEvent) -> Result<(), RouteError>;
}

/// A subscription request: which gateway handles the event, and who owns it.
#[derive(Clone)]
pub struct Subscription {
    /// Gateway the event is delivered through.
    pub gateway: Gateway,
    /// The subscriber. Weak so that the bus never keeps a router alive.
    pub listener: Weak<dyn HostListener>,
}

impl Subscription {
    /// Create a subscription.
    pub fn new(gateway: Gateway, listener: Weak<dyn HostListener>) -> Self {
        Self { gateway, listener }
    }

    /// Same gateway and same subscriber.
    pub fn same_as(&self, other: &Subscription) -> bool {
        self.gateway == other.gateway && Weak::ptr_eq(&self.listener, &other.listener)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("gateway", &self.gateway)
            .field("alive", &(self.listener.strong_count() > 0))
            .finish()
    }
}

/// Publish/subscribe transport provided by the host.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a host event bus",
    label = "missing `EventBus` implementation",
    note = "Implement `publish` and `subscribe` to connect Herald to a host."
)]
pub trait EventBus: Send + Sync {
    /// Fire an event. Delivery to subscribers may happen before this returns.
    fn publish(&self, event: HostEvent) -> Result<(), BusError>;

    /// Register a subscriber for an event name. A conforming bus delivers
    /// each event at most once per identical subscription.
    fn subscribe(&self, event_type: &str, subscription: Subscription);
}

/// Read-only access to live entity state.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a state store",
    label = "missing `StateStore` implementation"
)]
pub trait StateStore: Send + Sync {
    /// Current state of an entity, `None` when it does not exist.
    fn get(&self, entity_id: &str) -> Option<EntityState>;
}
