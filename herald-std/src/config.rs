//! Configuration loading.
//!
//! A configuration document holds the two definition sequences plus optional
//! [`RouterSettings`]. Missing required keys fail the whole load; nothing is
//! partially constructed.

use herald_core::{ConfigError, EventDefinition, TargetDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default name of the manual trigger event.
pub const DEFAULT_TRIGGER_EVENT: &str = "HA_EVENT";
/// Default name of the script completion event.
pub const DEFAULT_SCRIPT_EVENT: &str = "HA_SCRIPT_COMPLETED";
/// Default reserved target that holds script thresholds.
pub const DEFAULT_SCRIPT_TARGET: &str = "script";
/// Default state store entry holding the system identity.
pub const DEFAULT_SYSTEM_CODE_ENTITY: &str = "input_text.system_code";
/// Default bound on re-entrant dispatch.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

/// Tunables of the router. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Event the manual trigger gateway listens on.
    pub trigger_event: String,
    /// Event the script completion gateway listens on.
    pub script_event: String,
    /// Target whose thresholds are matched against finished script ids.
    pub script_target: String,
    /// State store entry read once for the system identity.
    pub system_code_entity: String,
    /// How many gateway entries may be nested on one thread.
    pub max_dispatch_depth: usize,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            trigger_event: DEFAULT_TRIGGER_EVENT.to_string(),
            script_event: DEFAULT_SCRIPT_EVENT.to_string(),
            script_target: DEFAULT_SCRIPT_TARGET.to_string(),
            system_code_entity: DEFAULT_SYSTEM_CODE_ENTITY.to_string(),
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }
}

/// A complete configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Router tunables.
    #[serde(default)]
    pub settings: RouterSettings,
    /// Event definitions in load order.
    pub events: Vec<EventDefinition>,
    /// Target definitions in load order.
    pub targets: Vec<TargetDefinition>,
}

impl HeraldConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Validate every definition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for event in &self.events {
            event.validate()?;
        }
        for target in &self.targets {
            target.validate()?;
        }
        Ok(())
    }
}
