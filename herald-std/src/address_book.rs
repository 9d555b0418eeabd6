//! The address book: event and target definitions keyed by name.

use herald_core::{
    ConfigError, EventDefinition, HashMapTable, HashMapTableBuilder, RouteResult, RouteTable,
    TargetDefinition,
};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Immutable-after-load mapping from names to definitions.
///
/// Duplicate names are accepted; the last definition loaded wins.
#[derive(Debug, Clone)]
pub struct AddressBook {
    events: HashMapTable<String, EventDefinition>,
    targets: HashMapTable<String, TargetDefinition>,
    listeners: Vec<String>,
}

impl AddressBook {
    /// Build the book from definition sequences.
    ///
    /// Every definition is validated first; one malformed entry fails the
    /// whole load.
    pub fn load(
        events: Vec<EventDefinition>,
        targets: Vec<TargetDefinition>,
    ) -> Result<Self, ConfigError> {
        if events.is_empty() {
            warn!("no events provided in the configuration");
        } else {
            info!(count = events.len(), "event configuration found");
        }
        if targets.is_empty() {
            warn!("no targets provided in the configuration");
        } else {
            info!(count = targets.len(), "target configuration found");
        }

        for event in &events {
            event.validate()?;
        }
        for target in &targets {
            target.validate()?;
        }

        let mut order: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        let mut event_table = HashMapTableBuilder::default();
        for event in events {
            if seen.insert(event.name.clone()) {
                order.push(event.name.clone());
            }
            debug!(event = %event.name, kind = event.kind.as_str(), "registering event");
            let name = event.name.clone();
            if event_table.insert(event.name.clone(), event).is_some() {
                warn!(event = %name, "duplicate event definition replaces the earlier one");
            }
        }

        let mut target_table = HashMapTableBuilder::default();
        for target in targets {
            debug!(target_name = %target.name, entity = target.entity_ref(), "registering target");
            let name = target.name.clone();
            if target_table.insert(target.name.clone(), target).is_some() {
                warn!(target_name = %name, "duplicate target definition replaces the earlier one");
            }
        }

        let events = event_table.build();
        let listeners = order
            .into_iter()
            .filter(|name| {
                events
                    .route(name.as_str())
                    .matched()
                    .is_some_and(EventDefinition::is_listener)
            })
            .collect();

        Ok(Self {
            events,
            targets: target_table.build(),
            listeners,
        })
    }

    /// Look up an event definition.
    pub fn find_event(&self, name: &str) -> RouteResult<'_, EventDefinition> {
        self.events.route(name)
    }

    /// Look up a target definition.
    pub fn find_target(&self, name: &str) -> RouteResult<'_, TargetDefinition> {
        self.targets.route(name)
    }

    /// Names of listener events, each once, in first-load order.
    pub fn listeners(&self) -> impl Iterator<Item = &str> {
        self.listeners.iter().map(String::as_str)
    }

    /// Number of distinct events.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of distinct targets.
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Normalize a callback's attribute payload.
    ///
    /// Each element (or the scalar itself) that names a known event is
    /// replaced by that event's full definition; anything else passes through.
    pub fn expand_attributes(&self, data: &Value) -> Value {
        match data {
            Value::Array(items) => Value::Array(items.iter().map(|i| self.expand_one(i)).collect()),
            other => self.expand_one(other),
        }
    }

    fn expand_one(&self, item: &Value) -> Value {
        let Some(definition) = item.as_str().and_then(|name| self.find_event(name).matched())
        else {
            return item.clone();
        };
        match serde_json::to_value(definition) {
            Ok(value) => value,
            Err(err) => {
                warn!(event = %definition.name, error = %err, "cannot expand event reference");
                item.clone()
            }
        }
    }
}
