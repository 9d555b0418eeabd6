//! # herald - Configuration-Driven Event Router
//!
//! `herald` listens on a host event bus, enriches events with live entity
//! state and fans them out to configured callback events. Routing is data:
//! an address book of event and target definitions loaded from JSON.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//! use herald::testing::{LocalBus, MemoryStore};
//!
//! let config = HeraldConfig::from_path("herald.json")?;
//! let bus = Arc::new(LocalBus::new());
//! let store = Arc::new(MemoryStore::new());
//! let router = EventRouter::load(config, bus.clone(), store)?;
//!
//! bus.publish(HostEvent::new("TEMP_HIGH", json!({ "target": { "targetId": "sensor.t1" } })))?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use herald_core::{
    // Errors
    AdapterError,
    BusError,
    // Definitions
    CallbackRule,
    ConfigError,
    // State
    EntitySnapshot,
    EntityState,
    // Wire objects
    EntityAction,
    EntityMessage,
    // Host seams
    EventBus,
    EventDefinition,
    EventKind,
    EventMessage,
    EventType,
    ExternalEnvelope,
    Gateway,
    // Lookup
    HashMapTable,
    HashMapTableBuilder,
    HeraldError,
    HostEvent,
    HostListener,
    MessagePlatform,
    OutboundMessage,
    Platform,
    RouteError,
    RouteResult,
    RouteTable,
    StateStore,
    Subscription,
    TargetDefinition,
    ThresholdRule,
};

pub use herald_std::{
    adapter::Adapter,
    address_book::AddressBook,
    config::{HeraldConfig, RouterSettings},
    depth::DepthGuard,
    identity::SystemIdentity,
    replay::Replay,
    resolver::StateResolver,
    router::{DispatchReport, EventRouter},
};

/// In-memory host collaborators.
pub mod testing {
    pub use herald_std::testing::{DeliveryFailure, LocalBus, MemoryStore};
}

/// Prelude module - common imports for Herald.
///
/// # Usage
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Configuration
        CallbackRule,
        EventDefinition,
        EventKind,
        HeraldConfig,
        Platform,
        TargetDefinition,
        ThresholdRule,
        // Engine
        EventRouter,
        RouteError,
        // Host seams
        EventBus,
        HostEvent,
        StateStore,
    };
}
