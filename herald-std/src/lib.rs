//! # herald-std
//!
//! The Herald routing engine and its in-memory host collaborators.
//!
//! This crate provides:
//! - **Address book**: [`AddressBook`](address_book::AddressBook)
//! - **State resolution**: [`StateResolver`](resolver::StateResolver)
//! - **Platform adapters**: [`Adapter`](adapter::Adapter)
//! - **Routing engine**: [`EventRouter`](router::EventRouter) and its gateways
//! - **Replay**: [`Replay`](replay::Replay)
//! - **Testing**: [`LocalBus`](testing::LocalBus), [`MemoryStore`](testing::MemoryStore)

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use herald_core;

// Modules
pub mod adapter;
pub mod address_book;
pub mod config;
pub mod depth;
pub mod gateway;
pub mod identity;
pub mod replay;
pub mod resolver;
pub mod router;
pub mod testing;
