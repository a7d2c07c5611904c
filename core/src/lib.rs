//! # ironhorizon-core
//!
//! Core domain traits and types for the ironhorizon CQRS/event-sourcing
//! runtime.
//!
//! This crate defines the contracts every other crate in the workspace
//! builds on: identifiers, the `Event`/`Command`/`Aggregate` domain
//! primitives, and the `EventStore`/`EventBus`/`CommandBus`/`ReadModelStore`
//! trait boundaries. It contains no concrete storage or transport — those
//! live in `ironhorizon-runtime` (in-process implementations) and
//! `ironhorizon-broker` (AMQP-backed implementations).
//!
//! ## Core Concepts
//!
//! - **Identifier**: names one aggregate instance; doubles as the event
//!   store's stream key and the bus's routing key component.
//! - **Event**: an immutable fact, appended to a stream and replayed to
//!   reconstruct aggregate state.
//! - **Command**: a request to change state, which an aggregate may accept
//!   (producing events) or reject.
//! - **Aggregate**: the consistency boundary — loaded by replaying its
//!   event stream, advanced by handling commands.
//! - **EventStore**: append-only, per-aggregate persistence with
//!   optimistic concurrency control.
//! - **EventBus**: three-tier (typed/local/global) fan-out for events.
//! - **CommandBus**: single-handler routing for commands.
//! - **ReadModelStore**: the query side of CQRS — denormalized views built
//!   by projections from the event stream.
//!
//! ## Architecture Principles
//!
//! - Append-only event streams as the single source of truth
//! - Optimistic concurrency via stream versioning, not locking
//! - Trait objects (`Box<dyn Event>`, `Box<dyn Command>`) plus string-keyed
//!   factory registries, in place of reflection
//! - Composition over inheritance for aggregate polymorphism
//!
//! ## Example
//!
//! ```
//! use ironhorizon_core::aggregate::{Aggregate, AggregateRoot};
//! use ironhorizon_core::command::Command;
//! use ironhorizon_core::error::DomainError;
//! use ironhorizon_core::event::{Event, EventError};
//! use ironhorizon_core::identifier::Identifier;
//!
//! #[derive(Debug)]
//! struct Counter {
//!     root: AggregateRoot,
//!     value: i64,
//! }
//!
//! #[derive(Debug)]
//! struct Incremented { counter_id: String }
//!
//! impl Event for Incremented {
//!     fn aggregate_id(&self) -> String { self.counter_id.clone() }
//!     fn aggregate_type(&self) -> &'static str { "Counter" }
//!     fn event_type(&self) -> &'static str { "Incremented" }
//!     fn to_json(&self) -> Result<serde_json::Value, EventError> {
//!         Ok(serde_json::json!({ "counter_id": self.counter_id }))
//!     }
//! }
//!
//! impl Aggregate for Counter {
//!     fn aggregate_type() -> &'static str { "Counter" }
//!     fn new(id: Identifier) -> Self { Self { root: AggregateRoot::new(id), value: 0 } }
//!     fn root(&self) -> &AggregateRoot { &self.root }
//!     fn root_mut(&mut self) -> &mut AggregateRoot { &mut self.root }
//!     fn apply(&mut self, event: &dyn Event) {
//!         if event.event_type() == "Incremented" { self.value += 1; }
//!     }
//!     fn handle(&mut self, _command: &dyn Command) -> Result<(), DomainError> {
//!         let id = self.root.id().to_string();
//!         self.record_event(Incremented { counter_id: id });
//!         Ok(())
//!     }
//! }
//! ```

pub mod aggregate;
pub mod command;
pub mod command_bus;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod event_store;
pub mod identifier;
pub mod read_model;
pub mod version;

pub use aggregate::{Aggregate, AggregateRoot};
pub use command::{Command, CommandFactory};
pub use command_bus::{CommandBus, CommandBusError, CommandHandler};
pub use error::DomainError;
pub use event::{Event, EventError, EventFactory, EventRecord};
pub use event_bus::{EventBus, EventBusError, EventHandler};
pub use event_store::{EventAppend, EventStore, EventStoreError};
pub use identifier::Identifier;
pub use read_model::{ReadModelError, ReadModelStore};
pub use version::Version;
