//! Inbound gateways.
//!
//! Each [`Gateway`] normalizes one host event shape into calls to
//! [`EventRouter::route`]:
//!
//! | Gateway            | Payload                                           |
//! |--------------------|---------------------------------------------------|
//! | `ManualTrigger`    | `event`/`data` re-emit, or `target` + `threshold` |
//! | `Listener`         | any; shaped by the event's platform               |
//! | `ScriptCompletion` | `payload.id` + `payload.data`                     |
//!
//! Every entry holds a [`DepthGuard`], so a cyclic configuration fails with
//! [`RouteError::DepthExceeded`] instead of recursing without bound.

use crate::{
    depth::DepthGuard,
    router::{DispatchReport, EventRouter},
};
use herald_core::{
    EventType, Gateway, HostEvent, HostListener, Platform, RouteError, TargetDefinition,
};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

impl HostListener for EventRouter {
    fn on_host_event(&self, gateway: Gateway, event: &HostEvent) -> Result<(), RouteError> {
        let _guard = DepthGuard::enter(&event.event_type, self.settings.max_dispatch_depth)
            .inspect_err(|err| error!(error = %err, "dropping event"))?;

        match gateway {
            Gateway::ManualTrigger => self.on_trigger(event),
            Gateway::Listener => self.on_listener(event),
            Gateway::ScriptCompletion => self.on_script_completed(event),
        }
    }
}

impl EventRouter {
    fn on_trigger(&self, event: &HostEvent) -> Result<(), RouteError> {
        let target = match event.data.get("target") {
            Some(Value::String(name)) if !name.is_empty() => Some(name.as_str()),
            None | Some(Value::Null) | Some(Value::String(_)) => None,
            Some(other) => {
                warn!(
                    event = %event.event_type,
                    value = %other,
                    "trigger `target` must be a target name, dropping event"
                );
                return Ok(());
            }
        };
        let to_fire = event.str_field("event");

        let Some(target) = target else {
            let Some(to_fire) = to_fire else {
                warn!(
                    event = %event.event_type,
                    "trigger not recognized, expected `event` or `target` in the payload"
                );
                return Ok(());
            };
            let data = event.data.get("data").cloned().unwrap_or(Value::Null);
            debug!(event = to_fire, %data, "re-emitting event");
            self.bus().publish(HostEvent::new(to_fire, data))?;
            return Ok(());
        };

        let book = self.address_book();
        let Some(definition) = book.find_target(target).matched() else {
            warn!(target_name = target, "target not found in the address book");
            return Ok(());
        };

        let snapshots = self.resolver.resolve(definition.entity_ref(), false);
        let target_data = wrap_target(serde_json::to_value(snapshots).unwrap_or_default());
        let base = event.str_field("message").unwrap_or_default();
        let report =
            self.run_thresholds(definition, event.str_field("threshold"), &target_data, base)?;
        debug!(target_name = target, ?report, "manual trigger routed");
        Ok(())
    }

    fn on_listener(&self, event: &HostEvent) -> Result<(), RouteError> {
        info!(event = %event.event_type, data = %event.data, "caught listener event");

        let book = self.address_book();
        let Some(definition) = book.find_event(&event.event_type).matched() else {
            return Err(RouteError::UnknownEvent(event.event_type.clone()));
        };

        let platform = event
            .str_field("platform")
            .map(Platform::parse)
            .or_else(|| definition.platform.clone());
        let message = event.str_field("message").unwrap_or_default();
        let level = EventType::Notice.as_str();

        let shaped = self
            .shape(platform.as_ref(), event.data.clone(), None, level, message)
            .unwrap_or(Value::Null);
        let mut target_data = Map::new();
        target_data.insert("target".to_string(), shaped);
        if let Some(sender) = event.data.get("sender").filter(|s| !s.is_null()) {
            target_data.insert("sender".to_string(), sender.clone());
        }

        let report = self.route(
            &Value::Object(target_data),
            &definition.callbacks,
            level,
            message,
        )?;
        debug!(event = %event.event_type, ?report, "listener event routed");
        Ok(())
    }

    fn on_script_completed(&self, event: &HostEvent) -> Result<(), RouteError> {
        let payload = event.data.get("payload");
        let script_id = payload.and_then(|p| p.get("id")).and_then(Value::as_str);
        let data = payload.and_then(|p| p.get("data"));
        let (Some(script_id), Some(data)) = (script_id, data) else {
            warn!(
                event = %event.event_type,
                "script completion not recognized, expected `payload.id` and `payload.data`"
            );
            return Ok(());
        };

        let script_target = self.settings.script_target.as_str();
        let book = self.address_book();
        let Some(definition) = book.find_target(script_target).matched() else {
            warn!(target_name = script_target, "no script target configured");
            return Ok(());
        };

        let base = payload
            .and_then(|p| p.get("message"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let report =
            self.run_thresholds(definition, Some(script_id), &wrap_target(data.clone()), base)?;
        debug!(script = script_id, ?report, "script completion routed");
        Ok(())
    }

    fn run_thresholds(
        &self,
        target: &TargetDefinition,
        selector: Option<&str>,
        target_data: &Value,
        base_message: &str,
    ) -> Result<DispatchReport, RouteError> {
        let mut total = DispatchReport::default();
        for threshold in target.thresholds_matching(selector) {
            debug!(
                target_name = %target.name,
                threshold = %threshold.event_label,
                "target threshold found"
            );
            let message = threshold.compose_message(base_message);
            let report =
                self.route(target_data, &threshold.callbacks, threshold.level(), &message)?;
            total.merge(report);
        }
        Ok(total)
    }
}

fn wrap_target(target: Value) -> Value {
    let mut data = Map::new();
    data.insert("target".to_string(), target);
    Value::Object(data)
}

#[cfg(test)]
mod tests {
    use crate::{
        address_book::AddressBook,
        config::RouterSettings,
        router::EventRouter,
        testing::{LocalBus, MemoryStore},
    };
    use herald_core::{
        CallbackRule, EntityState, EventBus, EventDefinition, EventKind, Gateway, HostEvent,
        HostListener, Platform, RouteError, TargetDefinition, ThresholdRule,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn setup(
        events: Vec<EventDefinition>,
        targets: Vec<TargetDefinition>,
    ) -> (Arc<EventRouter>, Arc<LocalBus>) {
        let bus = Arc::new(LocalBus::new());
        let store = MemoryStore::new()
            .with_state(EntityState::new("input_text.system_code", "home-1"))
            .with_state(EntityState::new("sensor.t1", "30").with_attribute("unit_of_measurement", "C"));
        let book = AddressBook::load(events, targets).unwrap();
        let router = EventRouter::new(book, RouterSettings::default(), bus.clone(), Arc::new(store));
        router.install();
        (router, bus)
    }

    #[test]
    fn test_trigger_re_emits_without_target() {
        let (_router, bus) = setup(vec![], vec![]);

        bus.publish(HostEvent::new("HA_EVENT", json!({ "event": "LIGHTS", "data": { "on": true } })))
            .unwrap();

        let fired = bus.published_named("LIGHTS");
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].data, json!({ "on": true }));
        assert!(bus.failures().is_empty());
    }

    #[test]
    fn test_trigger_without_event_or_target_is_dropped() {
        let (_router, bus) = setup(vec![], vec![]);

        bus.publish(HostEvent::new("HA_EVENT", json!({ "data": 1 }))).unwrap();

        assert_eq!(bus.published().len(), 1);
        assert!(bus.failures().is_empty());
    }

    #[test]
    fn test_trigger_unknown_target_is_dropped() {
        let (_router, bus) = setup(vec![], vec![]);

        bus.publish(HostEvent::new("HA_EVENT", json!({ "target": "nope", "threshold": "WARN" })))
            .unwrap();

        assert_eq!(bus.published().len(), 1);
        assert!(bus.failures().is_empty());
    }

    #[test]
    fn test_trigger_non_string_target_is_dropped() {
        let (_router, bus) = setup(vec![], vec![]);

        bus.publish(HostEvent::new(
            "HA_EVENT",
            json!({ "event": "LIGHTS", "target": { "targetId": "sensor.t1" } }),
        ))
        .unwrap();
        bus.publish(HostEvent::new("HA_EVENT", json!({ "event": "LIGHTS", "target": 7 })))
            .unwrap();

        assert!(bus.published_named("LIGHTS").is_empty());
        assert!(bus.failures().is_empty());
    }

    #[test]
    fn test_threshold_reports_are_merged() {
        let target = TargetDefinition::new("boiler")
            .with_entity("sensor.t1")
            .with_threshold(ThresholdRule {
                callbacks: vec![CallbackRule::to("A"), CallbackRule::to("B")],
                ..ThresholdRule::labelled("WARN")
            })
            .with_threshold(ThresholdRule {
                callbacks: vec![CallbackRule::to("C")],
                ..ThresholdRule::labelled("WARN")
            });
        let (router, bus) = setup(vec![], vec![]);

        let report = router
            .run_thresholds(&target, Some("WARN"), &json!({ "target": [] }), "")
            .unwrap();

        assert_eq!(report.dispatched, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(bus.published().len(), 3);
    }

    #[test]
    fn test_trigger_threshold_composes_level_and_message() {
        let target = TargetDefinition::new("boiler").with_entity("sensor.t1").with_threshold(
            ThresholdRule {
                level: Some("ALERT".into()),
                message: Some("too hot".into()),
                callbacks: vec![CallbackRule::to("OUT")],
                ..ThresholdRule::labelled("WARN")
            },
        );
        let (_router, bus) = setup(
            vec![EventDefinition::new("OUT", EventKind::Dispatcher, Some(Platform::External))],
            vec![target],
        );

        bus.publish(HostEvent::new(
            "HA_EVENT",
            json!({ "target": "boiler", "threshold": "WARN", "message": "boiler" }),
        ))
        .unwrap();

        let out = &bus.published_named("OUT")[0].data;
        assert_eq!(out["message"]["eventType"], "ALERT");
        assert_eq!(out["message"]["message"], "boiler - too hot");
        assert_eq!(out["message"]["target"][0]["state"], "30 C");
    }

    #[test]
    fn test_listener_without_definition_is_an_error() {
        let (router, _bus) = setup(vec![], vec![]);

        let err = router
            .on_host_event(Gateway::Listener, &HostEvent::new("GHOST", json!({})))
            .unwrap_err();
        assert_eq!(err, RouteError::UnknownEvent("GHOST".to_string()));
    }

    #[test]
    fn test_listener_carries_sender_and_honours_platform_override() {
        let (_router, bus) = setup(
            vec![
                EventDefinition::new("DOOR", EventKind::Listener, Some(Platform::State))
                    .with_callback(CallbackRule::to("OUT")),
            ],
            vec![],
        );

        bus.publish(HostEvent::new(
            "DOOR",
            json!({ "platform": "EVENT", "sender": "porch", "target": { "targetId": "CHIME" } }),
        ))
        .unwrap();

        assert_eq!(bus.published_named("CHIME").len(), 1);
        let out = &bus.published_named("OUT")[0].data;
        assert_eq!(out["target"], json!([{ "targetId": "CHIME" }]));
        assert_eq!(out["sender"], "porch");
    }

    #[test]
    fn test_script_completion_matches_script_id() {
        let script = TargetDefinition::new("script").with_threshold(ThresholdRule {
            callbacks: vec![CallbackRule::to("DONE")],
            ..ThresholdRule::labelled("script.backup")
        });
        let (_router, bus) = setup(vec![], vec![script]);

        bus.publish(HostEvent::new(
            "HA_SCRIPT_COMPLETED",
            json!({ "payload": { "id": "script.backup", "data": { "ok": true } } }),
        ))
        .unwrap();
        bus.publish(HostEvent::new(
            "HA_SCRIPT_COMPLETED",
            json!({ "payload": { "id": "script.other", "data": {} } }),
        ))
        .unwrap();
        bus.publish(HostEvent::new("HA_SCRIPT_COMPLETED", json!({ "payload": { "id": "x" } })))
            .unwrap();

        let done = bus.published_named("DONE");
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].data, json!({ "target": { "ok": true } }));
    }

    #[test]
    fn test_depth_limit_rejects_entry() {
        let bus = Arc::new(LocalBus::new());
        let settings = RouterSettings {
            max_dispatch_depth: 0,
            ..RouterSettings::default()
        };
        let book = AddressBook::load(vec![], vec![]).unwrap();
        let router = EventRouter::new(book, settings, bus, Arc::new(MemoryStore::new()));

        let err = router
            .on_host_event(Gateway::ManualTrigger, &HostEvent::new("HA_EVENT", json!({})))
            .unwrap_err();
        assert!(matches!(err, RouteError::DepthExceeded { limit: 0, .. }));
    }
}
