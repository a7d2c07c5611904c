//! # ironhorizon-runtime
//!
//! Default in-process implementations of the `ironhorizon-core` contracts,
//! plus the aggregate repository and command dispatcher that tie them
//! together.
//!
//! - [`InMemoryEventStore`] — `HashMap`-backed event store, for tests and
//!   local development.
//! - [`InProcessEventBus`] — three-tier (typed/local/global) in-process
//!   fan-out.
//! - [`InProcessCommandBus`] — single-handler in-process command routing.
//! - [`AggregateRepository`] — loads aggregates by replaying their event
//!   stream, saves them by appending new events.
//! - [`CommandDispatcher`] — routes a command to its aggregate type, loads
//!   the target aggregate, hands it the command, and saves the result.
//!
//! Broker-backed counterparts to the event and command buses live in
//! `ironhorizon-broker`.

mod command_bus;
mod dispatcher;
mod error;
mod event_bus;
mod memory_store;
mod repository;

pub use command_bus::InProcessCommandBus;
pub use dispatcher::CommandDispatcher;
pub use error::RuntimeError;
pub use event_bus::InProcessEventBus;
pub use memory_store::InMemoryEventStore;
pub use repository::{AggregateFactory, AggregateRepository};
