#![allow(dead_code)]

use herald::{
    EntityState, EventRouter, HeraldConfig,
    testing::{LocalBus, MemoryStore},
};
use serde_json::Value;
use std::sync::Arc;

// ============================================================================
// Host Fixtures
// ============================================================================

pub const SYSTEM_CODE: &str = "home-1";

/// A store with the system code and a small house.
pub fn house() -> MemoryStore {
    MemoryStore::new()
        .with_state(EntityState::new("input_text.system_code", SYSTEM_CODE))
        .with_state(
            EntityState::new("sensor.t1", "30")
                .with_attribute("unit_of_measurement", "C")
                .with_attribute("friendly_name", "Boiler Temperature"),
        )
        .with_state(EntityState::new("sensor.t2", "12").with_attribute("unit_of_measurement", "C"))
        .with_state(
            EntityState::new("group.boiler", "on")
                .with_members(["sensor.t1", "sensor.t2", "sensor.gone"]),
        )
}

pub struct Harness {
    pub bus: Arc<LocalBus>,
    pub router: Arc<EventRouter>,
}

/// Load `config` (a JSON document) against `store` on a fresh bus.
pub fn harness_with(config: Value, store: MemoryStore) -> Harness {
    let bus = Arc::new(LocalBus::new());
    let config = HeraldConfig::from_json(&config.to_string()).unwrap();
    let router = EventRouter::load(config, bus.clone(), Arc::new(store)).unwrap();
    Harness { bus, router }
}

pub fn harness(config: Value) -> Harness {
    harness_with(config, house())
}

/// Names of every published event, in order.
pub fn published_names(bus: &LocalBus) -> Vec<String> {
    bus.published().into_iter().map(|e| e.event_type).collect()
}
