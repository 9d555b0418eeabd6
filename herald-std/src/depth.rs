//! Bound on re-entrant dispatch.
//!
//! Dispatch is synchronous: a published callback may be delivered back into a
//! gateway before `publish` returns. Every gateway entry holds a
//! [`DepthGuard`]; the counter is per thread, so nested deliveries through
//! any number of routers on the same thread share one budget.

use herald_core::RouteError;
use std::{cell::Cell, marker::PhantomData};

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// One level of gateway nesting. Released on drop.
#[derive(Debug)]
pub struct DepthGuard {
    // Tied to the thread whose counter it incremented.
    _not_send: PhantomData<*const ()>,
}

impl DepthGuard {
    /// Enter one level, or fail if `limit` levels are already active.
    pub fn enter(event: &str, limit: usize) -> Result<Self, RouteError> {
        let depth = DEPTH.with(Cell::get);
        if depth >= limit {
            return Err(RouteError::DepthExceeded {
                event: event.to_string(),
                limit,
            });
        }
        DEPTH.with(|d| d.set(depth + 1));
        Ok(Self {
            _not_send: PhantomData,
        })
    }

    /// Levels currently active on this thread.
    pub fn current() -> usize {
        DEPTH.with(Cell::get)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
