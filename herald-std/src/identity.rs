//! Process-wide system identity.

use herald_core::{RouteError, StateStore};
use std::sync::OnceLock;
use tracing::info;

/// The system code read once from a well-known state store entry.
///
/// The first successful read is kept for the lifetime of the value. A failed
/// read is not cached, so a later caller may try again once the entry exists.
#[derive(Debug)]
pub struct SystemIdentity {
    entity_id: String,
    code: OnceLock<String>,
}

impl SystemIdentity {
    /// An unresolved identity backed by `entity_id`.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            code: OnceLock::new(),
        }
    }

    /// The backing entity id.
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// The code, if already resolved.
    pub fn get(&self) -> Option<&str> {
        self.code.get().map(String::as_str)
    }

    /// Resolve on first use, then reuse.
    ///
    /// Concurrent first callers may both read the store; only one value is
    /// ever stored.
    pub fn resolve(&self, store: &dyn StateStore) -> Result<&str, RouteError> {
        if let Some(code) = self.get() {
            return Ok(code);
        }

        let state = store
            .get(&self.entity_id)
            .ok_or_else(|| RouteError::MissingSystemIdentity(self.entity_id.clone()))?;
        if self.code.set(state.state).is_ok() {
            info!(entity = %self.entity_id, code = ?self.get(), "system code resolved");
        }

        self.get()
            .ok_or_else(|| RouteError::MissingSystemIdentity(self.entity_id.clone()))
    }
}
