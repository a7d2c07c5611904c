//! AMQP-backed [`ironhorizon_core::EventBus`] and
//! [`ironhorizon_core::CommandBus`] implementations, for deployments that
//! need events and commands to cross process boundaries.
//!
//! Both buses share the same connection lifecycle: [`AmqpEventBus::connect`]
//! / [`AmqpCommandBus::connect`] open the connection and declare the
//! exchange (`Init`), [`AmqpEventBus::start`] / [`AmqpCommandBus::start`]
//! declare this consumer's queue and spawn its consumer task (`Running`),
//! and [`AmqpEventBus::close`] / [`AmqpCommandBus::close`] drain and join
//! that task (`Closing` -> `Closed`).
//!
//! # Why AMQP, not Kafka
//!
//! The exchange/queue/routing-key model this crate implements — a topic
//! exchange for fan-out events, a direct exchange for single-handler
//! commands, durable queues per consumer, and per-message ack/reject with
//! no-requeue poison handling — maps onto AMQP's primitives directly.
//! `lapin` is this crate's client.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command_bus;
mod error;
mod event_bus;
mod state;

pub use command_bus::AmqpCommandBus;
pub use error::BrokerError;
pub use event_bus::AmqpEventBus;
pub use state::BrokerState;
