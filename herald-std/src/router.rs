//! # The routing engine
//!
//! [`EventRouter`] owns the address book and dispatches callbacks. Every
//! gateway (see [`crate::gateway`]) normalizes its inbound event into a
//! single call, [`EventRouter::route`], which walks the callback rules in
//! order:
//!
//! ```text
//! rule ──► address book ──► kind / platform (unknown: DISPATCHER, no platform)
//!      ──► attributes expanded ──► adapter shapes payload
//!      ──► DISPATCHER: publish on the host bus (may re-enter a gateway)
//!          LISTENER:   subscribe the router to that event
//! ```
//!
//! A failing callback is logged and skipped; its siblings still run.

use crate::{
    address_book::AddressBook,
    adapter::{Adapter, AdapterContext, AdapterInput},
    config::{HeraldConfig, RouterSettings},
    identity::SystemIdentity,
    resolver::StateResolver,
};
use herald_core::{
    CallbackRule, ConfigError, EventBus, EventKind, Gateway, HostEvent, HostListener, Platform,
    RouteError, StateStore, Subscription,
};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, error, info, warn};

/// Counts of what one [`EventRouter::route`] pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    /// Callbacks published on the host bus.
    pub dispatched: usize,
    /// Callbacks that subscribed the router to their event.
    pub subscribed: usize,
    /// Callbacks whose adapter produced nothing to dispatch.
    pub skipped: usize,
    /// Callbacks that failed.
    pub failed: usize,
}

impl DispatchReport {
    /// Accumulate another report.
    pub fn merge(&mut self, other: DispatchReport) {
        self.dispatched += other.dispatched;
        self.subscribed += other.subscribed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

enum CallbackOutcome {
    Dispatched,
    Subscribed,
    Skipped,
}

/// The configuration-driven event router.
pub struct EventRouter {
    book: RwLock<Arc<AddressBook>>,
    pub(crate) settings: RouterSettings,
    pub(crate) resolver: StateResolver,
    pub(crate) identity: SystemIdentity,
    bus: Arc<dyn EventBus>,
    me: Weak<EventRouter>,
}

impl EventRouter {
    /// Create a router. Nothing is subscribed until [`install`](Self::install).
    pub fn new(
        book: AddressBook,
        settings: RouterSettings,
        bus: Arc<dyn EventBus>,
        store: Arc<dyn StateStore>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            identity: SystemIdentity::new(settings.system_code_entity.clone()),
            book: RwLock::new(Arc::new(book)),
            settings,
            resolver: StateResolver::new(store),
            bus,
            me: me.clone(),
        })
    }

    /// Build the address book from `config`, create the router and subscribe
    /// it to its control events and every listener event.
    pub fn load(
        config: HeraldConfig,
        bus: Arc<dyn EventBus>,
        store: Arc<dyn StateStore>,
    ) -> Result<Arc<Self>, ConfigError> {
        let book = AddressBook::load(config.events, config.targets)?;
        let router = Self::new(book, config.settings, bus, store);
        router.install();
        Ok(router)
    }

    /// Replace the address book with one built from `config` and subscribe
    /// to its listener events.
    ///
    /// The router stays the same subscriber, so reloading an identical
    /// configuration adds no subscription. Settings are fixed at construction;
    /// differing settings in `config` are ignored with a warning. The host bus
    /// has no unsubscribe, so listeners dropped from the configuration stay
    /// subscribed and fail with [`RouteError::UnknownEvent`] once removed.
    pub fn reload(&self, config: HeraldConfig) -> Result<(), ConfigError> {
        let book = AddressBook::load(config.events, config.targets)?;
        if config.settings != self.settings {
            warn!("router settings cannot change on reload, keeping the current ones");
        }
        *self.book.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(book);
        info!("address book reloaded");
        self.install();
        Ok(())
    }

    /// Subscribe to the manual trigger, the script completion event and every
    /// listener event. Safe to call again: the host deduplicates identical
    /// subscriptions.
    pub fn install(&self) {
        self.subscribe(&self.settings.trigger_event, Gateway::ManualTrigger);
        info!(
            event = %self.settings.trigger_event,
            "fire this event to invoke the router manually"
        );
        self.subscribe(&self.settings.script_event, Gateway::ScriptCompletion);
        for name in self.address_book().listeners() {
            self.subscribe(name, Gateway::Listener);
        }
    }

    /// The current address book. A reload does not affect a book already
    /// handed out.
    pub fn address_book(&self) -> Arc<AddressBook> {
        self.book
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The active settings.
    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// The system identity, resolved or not.
    pub fn identity(&self) -> &SystemIdentity {
        &self.identity
    }

    pub(crate) fn bus(&self) -> &dyn EventBus {
        self.bus.as_ref()
    }

    fn subscribe(&self, event_type: &str, gateway: Gateway) {
        let listener: Weak<dyn HostListener> = self.me.clone();
        self.bus
            .subscribe(event_type, Subscription::new(gateway, listener));
        debug!(event = event_type, ?gateway, "listening on host event");
    }

    /// Dispatch `callbacks` for one matched event or threshold.
    ///
    /// Resolves the system identity on first use; failing that, nothing is
    /// dispatched and the error is returned. Every callback gets its own copy
    /// of `target_data`. A rule's `topic` is merged into that copy and carried
    /// forward to the rules after it.
    pub fn route(
        &self,
        target_data: &Value,
        callbacks: &[CallbackRule],
        level: &str,
        message: &str,
    ) -> Result<DispatchReport, RouteError> {
        self.identity.resolve(self.resolver.store())?;

        debug!(count = callbacks.len(), "found callbacks for the given event");
        let mut report = DispatchReport::default();
        let mut carried_topic: Option<&str> = None;
        for rule in callbacks {
            if let Some(topic) = rule.topic.as_deref() {
                debug!(event = %rule.target_event, topic, "injecting callback topic");
                carried_topic = Some(topic);
            }
            let mut data = target_data.clone();
            if let (Some(topic), Some(fields)) = (carried_topic, data.as_object_mut()) {
                fields.insert("topic".to_string(), Value::String(topic.to_string()));
            }

            match self.dispatch_callback(rule, data, level, message) {
                Ok(CallbackOutcome::Dispatched) => report.dispatched += 1,
                Ok(CallbackOutcome::Subscribed) => report.subscribed += 1,
                Ok(CallbackOutcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    error!(event = %rule.target_event, error = %err, "callback failed");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    fn dispatch_callback(
        &self,
        rule: &CallbackRule,
        target_data: Value,
        level: &str,
        message: &str,
    ) -> Result<CallbackOutcome, RouteError> {
        let event = rule.target_event.as_str();
        let book = self.address_book();
        let (kind, platform) = match book.find_event(event).matched() {
            Some(definition) => (definition.kind, definition.platform.as_ref()),
            None => {
                warn!(event, "event not found in the address book, falling back to dispatcher");
                (EventKind::Dispatcher, None)
            }
        };

        let attributes = rule.data.as_ref().map(|d| book.expand_attributes(d));
        let payload = self.shape(platform, target_data, attributes, level, message);

        match kind {
            EventKind::Dispatcher => {
                let Some(payload) = payload else {
                    warn!(event, "adapter produced no payload, dropping callback");
                    return Ok(CallbackOutcome::Skipped);
                };
                debug!(event, data = %payload, "firing callback event");
                self.bus.publish(HostEvent::new(event, payload))?;
                Ok(CallbackOutcome::Dispatched)
            }
            EventKind::Listener => {
                self.subscribe(event, Gateway::Listener);
                Ok(CallbackOutcome::Subscribed)
            }
        }
    }

    /// Run the adapter for `platform`. Unknown or absent platforms fall back
    /// to the state adapter without attributes.
    pub(crate) fn shape(
        &self,
        platform: Option<&Platform>,
        target_data: Value,
        attributes: Option<Value>,
        level: &str,
        message: &str,
    ) -> Option<Value> {
        let (adapter, attributes) = match platform.and_then(Adapter::for_platform) {
            Some(adapter) => (adapter, attributes),
            None => {
                warn!(
                    platform = platform.map_or("<none>", Platform::as_str),
                    "no adapter for platform, falling back to STATE"
                );
                (Adapter::State, None)
            }
        };
        debug!(?adapter, "shaping payload");

        let cx = AdapterContext {
            bus: self.bus.as_ref(),
            resolver: &self.resolver,
            identity: &self.identity,
        };
        adapter.apply(
            &cx,
            AdapterInput {
                target_data,
                attributes,
                level,
                message,
            },
        )
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let book = self.address_book();
        f.debug_struct("EventRouter")
            .field("events", &book.event_count())
            .field("targets", &book.target_count())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
