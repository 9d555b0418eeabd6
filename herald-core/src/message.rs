//! Wire value objects.
//!
//! [`ExternalEnvelope`] is the structured payload the external adapter
//! publishes; it is the only shape downstream consumers depend on.
//! [`EventMessage`] is the consumer-side reading of the envelope's `message`,
//! with the event type and platform checked against closed enums.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Severity classes understood by downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// Something is asked of the receiver.
    Request,
    /// Informational.
    Notice,
    /// Needs attention.
    Alert,
}

impl EventType {
    /// Wire spelling.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::Request => "REQUEST",
            EventType::Notice => "NOTICE",
            EventType::Alert => "ALERT",
        }
    }
}

/// Origin platform recorded in an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessagePlatform {
    /// Entity state.
    State,
    /// Host event.
    Event,
}

/// The structured payload published by the external adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalEnvelope {
    /// The message body.
    pub message: OutboundMessage,
    /// Transport partition, promoted from the target data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

/// Body of an [`ExternalEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    /// Level of the routed event (threshold level or `NOTICE`).
    pub event_type: String,
    /// Human-readable message.
    pub message: String,
    /// Process-wide system identity.
    pub system_code: String,
    /// Always [`MessagePlatform::Event`] for envelopes built by the router.
    pub platform: MessagePlatform,
    /// Originator, promoted from the target data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Target entries, always a sequence.
    #[serde(default)]
    pub target: Vec<Value>,
    /// Callback attributes, present only when the rule supplied some.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Value>,
}

/// An action an entity exposes to the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAction {
    /// Platform the action is executed on.
    pub platform: String,
    /// Display label.
    pub label: String,
    /// Value sent when the action is taken.
    pub value: Value,
}

/// One entity carried by an [`EventMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMessage {
    /// Entity identifier. Snapshots spell it `targetId`.
    #[serde(alias = "targetId")]
    pub entity_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// State string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Available actions.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<EntityAction>,
}

impl EntityMessage {
    /// The entity type, i.e. the identifier's domain.
    pub fn entity_type(&self) -> &str {
        crate::snapshot::domain_of(&self.entity_id)
    }
}

/// Consumer-side view of an outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    /// Originator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Severity class.
    pub event_type: EventType,
    /// Identity of the emitting system.
    pub system_code: String,
    /// Origin platform.
    pub platform: MessagePlatform,
    /// Entities, accepted as a single object or a list.
    #[serde(default, alias = "target", deserialize_with = "one_or_many")]
    pub entity: Vec<EntityMessage>,
}

impl EventMessage {
    /// Parse a message from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Parse a message from an already decoded value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}
