//! Offline replay of host events.
//!
//! [`Replay::run`] wires a router to a fresh [`LocalBus`] and [`MemoryStore`],
//! publishes a recorded sequence of host events and keeps what the bus saw.
//! The `herald run` command is a thin wrapper around it.

use crate::{
    config::HeraldConfig,
    router::EventRouter,
    testing::{DeliveryFailure, LocalBus, MemoryStore},
};
use herald_core::{EntityState, EventBus, HeraldError, HostEvent};
use std::sync::Arc;
use tracing::info;

/// Everything a replay published and every delivery that failed.
#[derive(Debug, Clone, Default)]
pub struct Replay {
    /// Published events in order, the replayed inputs included.
    pub published: Vec<HostEvent>,
    /// Failures reported by the router, in order.
    pub failures: Vec<DeliveryFailure>,
}

impl Replay {
    /// Load `config` over `states` and publish `events` in order.
    pub fn run<S, E>(config: HeraldConfig, states: S, events: E) -> Result<Self, HeraldError>
    where
        S: IntoIterator<Item = EntityState>,
        E: IntoIterator<Item = HostEvent>,
    {
        let bus = Arc::new(LocalBus::new());
        let store: MemoryStore = states.into_iter().collect();
        let router = EventRouter::load(config, bus.clone(), Arc::new(store))?;
        info!(
            ?router,
            trigger = %router.settings().trigger_event,
            listeners = router.address_book().listeners().count(),
            "router installed"
        );

        for event in events {
            bus.publish(event)?;
        }
        Ok(Self {
            published: bus.published(),
            failures: bus.failures(),
        })
    }

    /// Turn the first delivery failure into an error.
    pub fn strict(self) -> Result<Self, HeraldError> {
        match self.failures.first() {
            Some(failure) => Err(HeraldError::Route(failure.error.clone())),
            None => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{ConfigError, RouteError};
    use serde_json::json;

    fn config() -> HeraldConfig {
        HeraldConfig::from_json(
            &json!({
                "events": [
                    { "event": "TEMP_HIGH", "type": "listener", "platform": "STATE",
                      "callback": [ { "event": "NOTIFY" } ] }
                ],
                "targets": []
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_replay_records_dispatches() {
        let states = [
            EntityState::new("input_text.system_code", "home-1"),
            EntityState::new("sensor.t1", "30"),
        ];
        let events = [HostEvent::new("TEMP_HIGH", json!({ "target": { "targetId": "sensor.t1" } }))];

        let replay = Replay::run(config(), states, events).unwrap().strict().unwrap();

        let names: Vec<_> = replay.published.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(names, vec!["TEMP_HIGH", "NOTIFY"]);
    }

    #[test]
    fn test_strict_replay_surfaces_first_failure() {
        let events = [HostEvent::new("TEMP_HIGH", json!({}))];

        let replay = Replay::run(config(), Vec::new(), events).unwrap();
        assert_eq!(replay.failures.len(), 1);

        let err = replay.strict().unwrap_err();
        assert!(matches!(
            err,
            HeraldError::Route(RouteError::MissingSystemIdentity(_))
        ));
    }

    #[test]
    fn test_invalid_definitions_fail_as_config_errors() {
        let mut config = config();
        config.events[0].name = String::new();

        let err = Replay::run(config, Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, HeraldError::Config(ConfigError::EmptyField { .. })));
    }
}
