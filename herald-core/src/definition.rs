//! Event and target definitions as they appear in configuration.
//!
//! Definitions are deserialized once at startup and never change afterwards.
//! Field names follow the configuration format (`event`, `type`, `callback`,
//! `target`, `entity`, `events`), which is also the shape a definition takes
//! when it is substituted into a callback's attribute payload.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether the router subscribes to an event or only emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EventKind {
    /// The router subscribes to this event on the host bus.
    Listener,
    /// The event is only ever emitted.
    #[default]
    Dispatcher,
}

impl EventKind {
    /// Configuration spelling of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventKind::Listener => "listener",
            EventKind::Dispatcher => "dispatcher",
        }
    }
}

impl TryFrom<String> for EventKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "listener" => Ok(EventKind::Listener),
            "dispatcher" => Ok(EventKind::Dispatcher),
            _ => Err(format!(
                "unknown event type `{value}`, expected `listener` or `dispatcher`"
            )),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Selects the adapter that shapes data for an event.
///
/// Unrecognised names load as [`Platform::Unknown`]; the router falls back to
/// the state adapter for them at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Platform {
    /// Re-emits the nested target identifier as a host event.
    Event,
    /// Resolves live entity state.
    State,
    /// Builds the structured envelope for external transports.
    External,
    /// Any name outside the closed set.
    Unknown(String),
}

impl Platform {
    /// Map a configuration name to a platform. Legacy names are accepted.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "EVENT" | "HASSIO_EVENT" => Platform::Event,
            "STATE" | "HASSIO_STATE" | "GENERIC" => Platform::State,
            "EXTERNAL" | "HAKAFKA" => Platform::External,
            _ => Platform::Unknown(name.to_string()),
        }
    }

    /// Canonical spelling of the platform.
    pub fn as_str(&self) -> &str {
        match self {
            Platform::Event => "EVENT",
            Platform::State => "STATE",
            Platform::External => "EXTERNAL",
            Platform::Unknown(name) => name,
        }
    }
}

impl From<String> for Platform {
    fn from(name: String) -> Self {
        Platform::parse(&name)
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.as_str().to_string()
    }
}

/// One follow-up action triggered after an event or threshold is processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackRule {
    /// Name of the event to dispatch or subscribe to.
    #[serde(rename = "event")]
    pub target_event: String,
    /// Optional attribute payload handed to the adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Optional transport partition injected into the target data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl CallbackRule {
    /// A rule that only names its target event.
    pub fn to(target_event: impl Into<String>) -> Self {
        Self {
            target_event: target_event.into(),
            data: None,
            topic: None,
        }
    }

    /// Attach an attribute payload.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach a topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    fn validate(&self, context: impl FnOnce() -> String) -> Result<(), ConfigError> {
        if self.target_event.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                context: context(),
                field: "event",
            });
        }
        Ok(())
    }
}

/// A business event known to the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Unique event name.
    #[serde(rename = "event")]
    pub name: String,
    /// Listener or dispatcher.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Adapter selection; absent behaves like an unknown platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    /// Follow-up actions in order.
    #[serde(rename = "callback", default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<CallbackRule>,
}

impl EventDefinition {
    /// Create a definition without callbacks.
    pub fn new(name: impl Into<String>, kind: EventKind, platform: Option<Platform>) -> Self {
        Self {
            name: name.into(),
            kind,
            platform,
            callbacks: Vec::new(),
        }
    }

    /// Append a callback rule.
    pub fn with_callback(mut self, rule: CallbackRule) -> Self {
        self.callbacks.push(rule);
        self
    }

    /// Whether the router must subscribe to this event at startup.
    pub fn is_listener(&self) -> bool {
        self.kind == EventKind::Listener
    }

    /// Reject empty names and callbacks without a target event.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                context: "event definition".to_string(),
                field: "event",
            });
        }
        for (index, rule) in self.callbacks.iter().enumerate() {
            rule.validate(|| format!("event {:?} callback #{index}", self.name))?;
        }
        Ok(())
    }
}

/// A named severity band attached to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    /// Label matched against the inbound threshold selector.
    #[serde(rename = "event")]
    pub event_label: String,
    /// Severity label; falls back to `event_label`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Suffix appended to the carried message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Follow-up actions in order.
    #[serde(rename = "callback", default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<CallbackRule>,
}

impl ThresholdRule {
    /// Create a threshold with only a label.
    pub fn labelled(event_label: impl Into<String>) -> Self {
        Self {
            event_label: event_label.into(),
            level: None,
            message: None,
            callbacks: Vec::new(),
        }
    }

    /// Effective severity label.
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(&self.event_label)
    }

    /// Whether this threshold answers to `selector`.
    pub fn matches(&self, selector: &str) -> bool {
        self.event_label == selector
    }

    /// The carried message with this threshold's suffix, if any.
    pub fn compose_message(&self, base: &str) -> String {
        match &self.message {
            Some(suffix) => format!("{base} - {suffix}"),
            None => base.to_string(),
        }
    }
}

/// A named, addressable entity or group plus its thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDefinition {
    /// Unique target name.
    #[serde(rename = "target")]
    pub name: String,
    /// State store identifier; defaults to the target name.
    #[serde(rename = "entity", default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Threshold rules in order.
    #[serde(rename = "events", default, skip_serializing_if = "Vec::is_empty")]
    pub thresholds: Vec<ThresholdRule>,
}

impl TargetDefinition {
    /// Create a target whose entity reference is its own name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: None,
            thresholds: Vec::new(),
        }
    }

    /// Point the target at a different state store identifier.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Append a threshold rule.
    pub fn with_threshold(mut self, threshold: ThresholdRule) -> Self {
        self.thresholds.push(threshold);
        self
    }

    /// Identifier resolved against the state store.
    pub fn entity_ref(&self) -> &str {
        self.entity.as_deref().unwrap_or(&self.name)
    }

    /// Every threshold whose label equals `selector`, in configured order.
    ///
    /// A missing selector matches nothing.
    pub fn thresholds_matching<'a>(
        &'a self,
        selector: Option<&'a str>,
    ) -> impl Iterator<Item = &'a ThresholdRule> + 'a {
        self.thresholds
            .iter()
            .filter(move |threshold| selector.is_some_and(|s| threshold.matches(s)))
    }

    /// Reject empty names and callbacks without a target event.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyField {
                context: "target definition".to_string(),
                field: "target",
            });
        }
        for threshold in &self.thresholds {
            if threshold.event_label.trim().is_empty() {
                return Err(ConfigError::EmptyField {
                    context: format!("target {:?} threshold", self.name),
                    field: "event",
                });
            }
            for (index, rule) in threshold.callbacks.iter().enumerate() {
                rule.validate(|| {
                    format!(
                        "target {:?} threshold {:?} callback #{index}",
                        self.name, threshold.event_label
                    )
                })?;
            }
        }
        Ok(())
    }
}
