//! Platform adapters.
//!
//! An adapter turns `(target data, attributes, level, message)` into the
//! payload that travels with a callback. The set is closed: [`Adapter`] has
//! one variant per known [`Platform`], and [`Adapter::for_platform`] is the
//! total mapping with `None` for anything unknown. The router decides what to
//! do with `None` (fall back to [`Adapter::State`] without attributes).
//!
//! Adapters never fail outward. A shaping error is logged and reported as
//! "no payload" so the caller can skip the dispatch.

use crate::{identity::SystemIdentity, resolver::StateResolver};
use herald_core::{
    AdapterError, EventBus, ExternalEnvelope, HostEvent, MessagePlatform, OutboundMessage,
    Platform,
};
use serde_json::{Map, Value, json};
use tracing::{error, info};

/// Collaborators an adapter may need.
pub struct AdapterContext<'a> {
    /// Bus used by side-effecting adapters.
    pub bus: &'a dyn EventBus,
    /// State lookups.
    pub resolver: &'a StateResolver,
    /// System code for outbound envelopes.
    pub identity: &'a SystemIdentity,
}

/// What an adapter shapes.
#[derive(Debug, Clone)]
pub struct AdapterInput<'a> {
    /// Target data of the routed event. Owned: adapters may consume keys.
    pub target_data: Value,
    /// Normalized callback attributes.
    pub attributes: Option<Value>,
    /// Level of the routed event.
    pub level: &'a str,
    /// Message of the routed event.
    pub message: &'a str,
}

/// A payload shaping strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapter {
    /// Re-emit `target.targetId` as a host event.
    Event,
    /// Resolve `target.targetId` into snapshots.
    State,
    /// Build an [`ExternalEnvelope`].
    External,
}

impl Adapter {
    /// The adapter for a platform, `None` when the platform is unknown.
    pub fn for_platform(platform: &Platform) -> Option<Self> {
        match platform {
            Platform::Event => Some(Adapter::Event),
            Platform::State => Some(Adapter::State),
            Platform::External => Some(Adapter::External),
            Platform::Unknown(_) => None,
        }
    }

    /// Shape a payload. `None` means there is nothing to dispatch.
    pub fn apply(self, cx: &AdapterContext<'_>, input: AdapterInput<'_>) -> Option<Value> {
        let result = match self {
            Adapter::Event => event_payload(cx, input),
            Adapter::State => Ok(state_payload(cx, input)),
            Adapter::External => external_payload(cx, input),
        };
        match result {
            Ok(payload) => Some(payload),
            Err(err) => {
                error!(adapter = ?self, error = %err, "cannot shape payload");
                None
            }
        }
    }
}

/// The nested `target.targetId` of some target data.
fn nested_target_id(target_data: &Value) -> Option<&Value> {
    target_data.get("target")?.get("targetId")
}

fn event_payload(cx: &AdapterContext<'_>, input: AdapterInput<'_>) -> Result<Value, AdapterError> {
    let Some(target_id) = nested_target_id(&input.target_data)
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return Ok(json!([]));
    };

    info!(event = %target_id, "firing host event");
    cx.bus
        .publish(HostEvent::new(target_id.clone(), input.target_data))?;
    Ok(json!([{ "targetId": target_id }]))
}

fn state_payload(cx: &AdapterContext<'_>, input: AdapterInput<'_>) -> Value {
    let snapshots = match nested_target_id(&input.target_data) {
        Some(Value::String(id)) => Some(cx.resolver.resolve(id, false)),
        Some(Value::Array(ids)) => {
            Some(cx.resolver.resolve_all(ids.iter().filter_map(Value::as_str)))
        }
        _ => None,
    };
    match snapshots {
        Some(snapshots) => {
            serde_json::to_value(snapshots).unwrap_or_else(|_| Value::Array(Vec::new()))
        }
        None => input.target_data,
    }
}

fn external_payload(
    cx: &AdapterContext<'_>,
    input: AdapterInput<'_>,
) -> Result<Value, AdapterError> {
    let system_code = cx.identity.resolve(cx.resolver.store())?.to_string();

    let (sender, topic, target) = match input.target_data {
        Value::Null => (None, None, Vec::new()),
        Value::Object(data) if data.is_empty() => (None, None, Vec::new()),
        Value::Object(mut data) => {
            let sender = take_promoted(&mut data, "sender");
            let topic = take_promoted(&mut data, "topic");
            let target = match data.remove("target") {
                Some(Value::Array(items)) => items,
                Some(Value::Null) | None => return Err(AdapterError::MissingField("target")),
                Some(single) => vec![single],
            };
            (sender, topic, target)
        }
        _ => return Err(AdapterError::NotAnObject("target data")),
    };

    let envelope = ExternalEnvelope {
        message: OutboundMessage {
            event_type: input.level.to_string(),
            message: input.message.to_string(),
            system_code,
            platform: MessagePlatform::Event,
            sender,
            target,
            command: input.attributes.filter(has_content),
        },
        topic,
    };
    Ok(serde_json::to_value(envelope)?)
}

/// Whether attributes carry anything worth sending as a command.
fn has_content(attributes: &Value) -> bool {
    match attributes {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        _ => true,
    }
}

/// Remove `key` from the top level, or else from a nested `target` object,
/// and render it as a string.
fn take_promoted(data: &mut Map<String, Value>, key: &str) -> Option<String> {
    let value = match data.remove(key) {
        Some(value) => value,
        None => data.get_mut("target")?.as_object_mut()?.remove(key)?,
    };
    Some(match value {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{LocalBus, MemoryStore};
    use herald_core::{EntityState, EventMessage, EventType};
    use std::sync::Arc;

    struct Fixture {
        bus: LocalBus,
        resolver: StateResolver,
        identity: SystemIdentity,
    }

    impl Fixture {
        fn new() -> Self {
            let store = MemoryStore::new()
                .with_state(EntityState::new("input_text.system_code", "home-1"))
                .with_state(
                    EntityState::new("sensor.t1", "30").with_attribute("unit_of_measurement", "C"),
                )
                .with_state(EntityState::new("sensor.t2", "12"));
            Self {
                bus: LocalBus::new(),
                resolver: StateResolver::new(Arc::new(store)),
                identity: SystemIdentity::new("input_text.system_code"),
            }
        }

        fn cx(&self) -> AdapterContext<'_> {
            AdapterContext {
                bus: &self.bus,
                resolver: &self.resolver,
                identity: &self.identity,
            }
        }
    }

    fn input(target_data: Value, attributes: Option<Value>) -> AdapterInput<'static> {
        AdapterInput {
            target_data,
            attributes,
            level: "NOTICE",
            message: "hello",
        }
    }

    #[test]
    fn test_platform_mapping_is_total() {
        assert_eq!(Adapter::for_platform(&Platform::Event), Some(Adapter::Event));
        assert_eq!(Adapter::for_platform(&Platform::State), Some(Adapter::State));
        assert_eq!(Adapter::for_platform(&Platform::External), Some(Adapter::External));
        assert_eq!(Adapter::for_platform(&Platform::Unknown("x".into())), None);
    }

    #[test]
    fn test_event_adapter_fires_target_id() {
        let fx = Fixture::new();
        let target_data = json!({ "target": { "targetId": "script.run" } });

        let out = Adapter::Event.apply(&fx.cx(), input(target_data.clone(), None));

        assert_eq!(out, Some(json!([{ "targetId": "script.run" }])));
        let published = fx.bus.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event_type, "script.run");
        assert_eq!(published[0].data, target_data);
    }

    #[test]
    fn test_event_adapter_without_target_id_has_no_effect() {
        let fx = Fixture::new();
        let out = Adapter::Event.apply(&fx.cx(), input(json!({ "target": [] }), None));

        assert_eq!(out, Some(json!([])));
        assert!(fx.bus.published().is_empty());
    }

    #[test]
    fn test_event_adapter_publish_failure_yields_no_payload() {
        let fx = Fixture::new();
        fx.bus.close();
        let out = Adapter::Event.apply(
            &fx.cx(),
            input(json!({ "target": { "targetId": "script.run" } }), None),
        );
        assert_eq!(out, None);
    }

    #[test]
    fn test_state_adapter_resolves_single_and_many() {
        let fx = Fixture::new();

        let out = Adapter::State
            .apply(&fx.cx(), input(json!({ "target": { "targetId": "sensor.t1" } }), None))
            .unwrap();
        assert_eq!(out[0]["state"], "30 C");

        let out = Adapter::State
            .apply(
                &fx.cx(),
                input(json!({ "target": { "targetId": ["sensor.t1", "sensor.gone", "sensor.t2"] } }), None),
            )
            .unwrap();
        assert_eq!(out.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_state_adapter_passes_through_without_target_id() {
        let fx = Fixture::new();
        let data = json!({ "target": [{ "targetId": "sensor.t1" }], "topic": "t" });
        let out = Adapter::State.apply(&fx.cx(), input(data.clone(), None));
        assert_eq!(out, Some(data));
    }

    #[test]
    fn test_external_adapter_promotes_sender_and_topic() {
        let fx = Fixture::new();
        let data = json!({ "target": { "sender": "x", "topic": "t", "targetId": "a.b" } });

        let out = Adapter::External.apply(&fx.cx(), input(data, None)).unwrap();

        assert_eq!(
            out,
            json!({
                "message": {
                    "eventType": "NOTICE",
                    "message": "hello",
                    "systemCode": "home-1",
                    "platform": "EVENT",
                    "sender": "x",
                    "target": [{ "targetId": "a.b" }]
                },
                "topic": "t"
            })
        );
    }

    #[test]
    fn test_external_adapter_top_level_keys_and_command() {
        let fx = Fixture::new();
        let data = json!({
            "sender": "kitchen",
            "topic": "alerts",
            "target": [{ "targetId": "sensor.t1", "state": "30 C" }]
        });

        let out = Adapter::External
            .apply(&fx.cx(), input(data, Some(json!(["LIGHTS_OFF"]))))
            .unwrap();

        assert_eq!(out["topic"], "alerts");
        assert_eq!(out["message"]["sender"], "kitchen");
        assert_eq!(out["message"]["command"], json!(["LIGHTS_OFF"]));
        assert_eq!(out["message"]["target"].as_array().map(Vec::len), Some(1));

        let message = EventMessage::from_value(out["message"].clone()).unwrap();
        assert_eq!(message.event_type, EventType::Notice);
        assert_eq!(message.entity[0].entity_id, "sensor.t1");
    }

    #[test]
    fn test_external_adapter_omits_empty_command() {
        let fx = Fixture::new();
        for empty in [json!([]), json!({}), json!(""), Value::Null] {
            let out = Adapter::External
                .apply(&fx.cx(), input(json!({ "target": [] }), Some(empty)))
                .unwrap();
            assert!(out["message"].get("command").is_none());
        }

        let out = Adapter::External
            .apply(&fx.cx(), input(json!({ "target": [] }), Some(json!([0]))))
            .unwrap();
        assert_eq!(out["message"]["command"], json!([0]));
    }

    #[test]
    fn test_external_adapter_failures_yield_no_payload() {
        let fx = Fixture::new();
        assert_eq!(
            Adapter::External.apply(&fx.cx(), input(json!({ "sender": "x" }), None)),
            None
        );
        assert_eq!(Adapter::External.apply(&fx.cx(), input(json!("text"), None)), None);

        let empty = Adapter::External.apply(&fx.cx(), input(json!({}), None)).unwrap();
        assert_eq!(empty["message"]["target"], json!([]));
    }

    #[test]
    fn test_external_adapter_needs_system_identity() {
        let fx = Fixture {
            identity: SystemIdentity::new("input_text.absent"),
            ..Fixture::new()
        };
        let out = Adapter::External.apply(&fx.cx(), input(json!({ "target": [] }), None));
        assert_eq!(out, None);
    }
}
