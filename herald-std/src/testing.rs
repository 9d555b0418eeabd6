//! In-memory host collaborators.
//!
//! These stand in for the host environment in tests and in the `herald`
//! replay binary.
//!
//! # Features
//!
//! - [`LocalBus`]: A synchronous, re-entrant [`EventBus`] that records every
//!   published event and every delivery failure
//! - [`MemoryStore`]: A [`StateStore`] backed by a map

use herald_core::{
    BusError, EntityState, EventBus, Gateway, HostEvent, RouteError, StateStore, Subscription,
};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError, RwLock},
};
use tracing::{debug, error};

// ============================================================================
// Local Bus
// ============================================================================

/// A failed delivery, as observed by the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// The event being delivered.
    pub event_type: String,
    /// The gateway it was delivered through.
    pub gateway: Gateway,
    /// What the subscriber returned.
    pub error: RouteError,
}

#[derive(Default)]
struct BusState {
    subscriptions: HashMap<String, Vec<Subscription>>,
    published: Vec<HostEvent>,
    failures: Vec<DeliveryFailure>,
    closed: bool,
}

/// A synchronous in-process event bus.
///
/// `publish` records the event and delivers it to every live subscriber
/// before returning. The internal lock is never held during delivery, so
/// subscribers may publish and subscribe re-entrantly.
///
/// # Example
///
/// ```rust,ignore
/// let bus = Arc::new(LocalBus::new());
/// let router = EventRouter::load(config, bus.clone(), store)?;
///
/// bus.publish(HostEvent::new("TEMP_HIGH", json!({})))?;
/// assert_eq!(bus.published_named("NOTIFY").len(), 1);
/// ```
#[derive(Default)]
pub struct LocalBus {
    state: Mutex<BusState>,
}

impl LocalBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every event published so far, in order.
    pub fn published(&self) -> Vec<HostEvent> {
        self.lock().published.clone()
    }

    /// Published events with the given name, in order.
    pub fn published_named(&self, event_type: &str) -> Vec<HostEvent> {
        self.lock()
            .published
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Number of live subscriptions for an event name.
    pub fn subscription_count(&self, event_type: &str) -> usize {
        self.lock()
            .subscriptions
            .get(event_type)
            .map_or(0, |subs| subs.iter().filter(|s| s.listener.strong_count() > 0).count())
    }

    /// Failures reported by subscribers, in order.
    pub fn failures(&self) -> Vec<DeliveryFailure> {
        self.lock().failures.clone()
    }

    /// Refuse further publishing.
    pub fn close(&self) {
        self.lock().closed = true;
    }
}

impl EventBus for LocalBus {
    fn publish(&self, event: HostEvent) -> Result<(), BusError> {
        let subscribers = {
            let mut state = self.lock();
            if state.closed {
                return Err(BusError::Closed);
            }
            state.published.push(event.clone());
            state
                .subscriptions
                .get(&event.event_type)
                .cloned()
                .unwrap_or_default()
        };

        debug!(event = %event.event_type, subscribers = subscribers.len(), "publishing");
        for subscription in subscribers {
            let Some(listener) = subscription.listener.upgrade() else {
                continue;
            };
            if let Err(err) = listener.on_host_event(subscription.gateway, &event) {
                error!(event = %event.event_type, gateway = ?subscription.gateway, error = %err, "delivery failed");
                self.lock().failures.push(DeliveryFailure {
                    event_type: event.event_type.clone(),
                    gateway: subscription.gateway,
                    error: err,
                });
            }
        }
        Ok(())
    }

    fn subscribe(&self, event_type: &str, subscription: Subscription) {
        let mut state = self.lock();
        let subs = state.subscriptions.entry(event_type.to_string()).or_default();
        if subs.iter().any(|s| s.same_as(&subscription)) {
            debug!(event = event_type, "already subscribed");
            return;
        }
        subs.push(subscription);
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// A state store backed by a map.
#[derive(Default)]
pub struct MemoryStore {
    states: RwLock<HashMap<String, EntityState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state, builder style.
    pub fn with_state(self, state: EntityState) -> Self {
        self.insert(state);
        self
    }

    /// Insert or replace a state.
    pub fn insert(&self, state: EntityState) {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(state.entity_id.clone(), state);
    }

    /// Remove a state.
    pub fn remove(&self, entity_id: &str) -> Option<EntityState> {
        self.states
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(entity_id)
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.states.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<EntityState> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = EntityState>>(iter: I) -> Self {
        let store = Self::new();
        for state in iter {
            store.insert(state);
        }
        store
    }
}

impl StateStore for MemoryStore {
    fn get(&self, entity_id: &str) -> Option<EntityState> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity_id)
            .cloned()
    }
}
