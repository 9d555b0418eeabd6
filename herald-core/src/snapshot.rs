//! Entity state as read from the host state store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Domain prefix that marks an identifier as a group of entities.
pub const GROUP_DOMAIN: &str = "group";

/// The domain part of an `domain.object_id` identifier.
pub fn domain_of(entity_id: &str) -> &str {
    entity_id
        .split_once('.')
        .map_or("", |(domain, _)| domain)
}

/// Whether an identifier denotes a group.
pub fn is_group(entity_id: &str) -> bool {
    domain_of(entity_id) == GROUP_DOMAIN
}

/// A record held by the host state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Full `domain.object_id` identifier.
    pub entity_id: String,
    /// Raw state string.
    pub state: String,
    /// Free-form attributes (`friendly_name`, `unit_of_measurement`,
    /// `entity_id` for group members, ...).
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityState {
    /// Create a state record without attributes.
    pub fn new(entity_id: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: Map::new(),
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the member list of a group.
    pub fn with_members<I, S>(self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<Value> = members
            .into_iter()
            .map(|m| Value::String(m.into()))
            .collect();
        self.with_attribute("entity_id", members)
    }

    /// The domain part of the identifier.
    pub fn domain(&self) -> &str {
        domain_of(&self.entity_id)
    }

    /// The object id part of the identifier.
    pub fn object_id(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(_, object_id)| object_id)
    }

    /// Display name: `friendly_name` if set, else the object id with
    /// underscores turned into spaces.
    pub fn name(&self) -> String {
        match self.attributes.get("friendly_name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => self.object_id().replace('_', " "),
        }
    }

    /// The `unit_of_measurement` attribute, if any.
    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.attributes
            .get("unit_of_measurement")
            .and_then(Value::as_str)
    }

    /// Group members in the order the store lists them.
    pub fn members(&self) -> Vec<&str> {
        match self.attributes.get("entity_id") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(single)) => vec![single.as_str()],
            _ => Vec::new(),
        }
    }

    /// State suffixed with its unit of measurement, if the store has one.
    pub fn display_state(&self) -> String {
        match self.unit_of_measurement() {
            Some(unit) => format!("{} {}", self.state, unit),
            None => self.state.clone(),
        }
    }
}

/// A point-in-time read of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySnapshot {
    /// The entity identifier.
    pub target_id: String,
    /// The identifier's domain.
    pub domain: String,
    /// Display name.
    pub label: String,
    /// State with unit of measurement.
    pub state: String,
}

impl EntitySnapshot {
    /// Snapshot a state record.
    pub fn from_state(state: &EntityState) -> Self {
        Self {
            target_id: state.entity_id.clone(),
            domain: state.domain().to_string(),
            label: state.name(),
            state: state.display_state(),
        }
    }

    /// Synthetic snapshot standing for a group itself.
    pub fn group_header(group: &EntityState) -> Self {
        Self {
            domain: GROUP_DOMAIN.to_string(),
            ..Self::from_state(group)
        }
    }
}
