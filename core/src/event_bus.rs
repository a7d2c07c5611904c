//! Event bus: three-tier handler fan-out for cross-aggregate communication.
//!
//! Events flow from the event store (source of truth, see
//! [`crate::event_store`]) to the bus after a successful append, and from
//! there to whichever handlers are registered. Handlers come in three
//! tiers, checked in this order for every event:
//!
//! 1. **Typed handlers** — registered for one specific `event_type`, e.g.
//!    "notify on `OrderPlaced`".
//! 2. **Local handlers** — registered on a specific bus instance, invoked
//!    for every event that instance publishes, regardless of type.
//! 3. **Global handlers** — registered once and invoked for every event
//!    published on every bus instance in the process; used for
//!    process-wide concerns such as audit logging.
//!
//! # Delivery Semantics
//!
//! The in-process bus (`ironhorizon-runtime::InProcessEventBus`) delivers
//! at-most-once: a handler that panics halts delivery to handlers
//! registered after it for that event, because nothing isolates one
//! handler's panic from another's call frame. The broker-backed bus
//! (`ironhorizon-broker::AmqpEventBus`) delivers at-least-once: each
//! consumer acks only after its handler tier returns successfully, and a
//! handler error rejects the message without requeue (the poison-message
//! policy — a message a handler can never process is dropped rather than
//! retried forever).
//!
//! # Handler Identity
//!
//! Handlers are held by `Arc` identity, not by value equality: a tier is a
//! set keyed on `Arc::ptr_eq`, so registering the same `Arc<dyn
//! EventHandler>` twice for the same tier is a no-op, while two handlers
//! with identical behavior behind distinct `Arc`s are still separate
//! registrations (see [`register_unique`]). There is no handler-removal
//! API: a bus's registrations live for the bus's lifetime.

use crate::event::EventRecord;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during event bus operations.
#[derive(Error, Debug, Clone)]
pub enum EventBusError {
    /// The bus could not connect to its transport (broker-backed buses
    /// only; the in-process bus never returns this).
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Publishing an event failed.
    #[error("publish failed for event type '{event_type}': {reason}")]
    PublishFailed {
        /// The event type that failed to publish.
        event_type: String,
        /// The reason for failure.
        reason: String,
    },

    /// Attempted to register a handler for an event type that already has
    /// one registered in a slot that requires uniqueness.
    #[error("handler already set for '{0}'")]
    HandlerAlreadySet(String),

    /// Attempted to remove a handler that was never registered.
    #[error("handler not found for '{0}'")]
    HandlerNotFound(String),

    /// The event payload could not be deserialized by a handler.
    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),

    /// A transport-level error from the underlying broker client.
    #[error("transport error: {0}")]
    TransportError(String),
}

/// Handles events delivered by an [`EventBus`].
///
/// # Dyn Compatibility
///
/// Returns a boxed future rather than using `async fn` so that handlers can
/// be stored as `Arc<dyn EventHandler>` in the bus's typed/local/global
/// tables.
pub trait EventHandler: Send + Sync {
    /// Handle one delivered event.
    ///
    /// # Errors
    ///
    /// Returning an error from a broker-backed bus causes the message to be
    /// rejected without requeue (dropped as poison); the in-process bus
    /// only logs the error and continues to the next handler.
    fn handle_event(
        &self,
        event: &EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;
}

/// Publish/subscribe fan-out for events, with typed, local, and global
/// handler tiers.
///
/// # Dyn Compatibility
///
/// Uses `Pin<Box<dyn Future>>` returns so implementations can be held as
/// `Arc<dyn EventBus>` by the repository and the projection manager.
pub trait EventBus: Send + Sync {
    /// Publish an event to every matching typed, local, and global handler.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::PublishFailed`] if the transport itself
    /// fails to accept the event (not if an individual handler errors —
    /// handler errors are the handler tier's own concern, see
    /// [`EventHandler::handle_event`]).
    fn publish_event(
        &self,
        event: EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;

    /// Register a handler invoked only for events whose `event_type`
    /// matches.
    ///
    /// # Errors
    ///
    /// Implementations may reject this call after the bus has started
    /// consuming, depending on their state machine (see
    /// `ironhorizon-broker::AmqpEventBus`'s `Init -> Running` transition).
    fn add_typed_handler(
        &self,
        event_type: &'static str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError>;

    /// Register a handler invoked for every event this bus instance
    /// publishes, regardless of type.
    ///
    /// # Errors
    ///
    /// See [`EventBus::add_typed_handler`].
    fn add_local_handler(&self, handler: Arc<dyn EventHandler>) -> Result<(), EventBusError>;

    /// Register a handler invoked for every event published on any bus
    /// instance sharing this process's global handler table.
    ///
    /// # Errors
    ///
    /// See [`EventBus::add_typed_handler`].
    fn add_global_handler(&self, handler: Arc<dyn EventHandler>) -> Result<(), EventBusError>;
}

/// Insert `handler` into `tier` unless an `Arc` pointing at the same
/// handler is already present, per the identity-not-value semantics
/// documented on this module.
///
/// Shared by every [`EventBus`] implementation so typed/local/global tier
/// storage behaves identically regardless of transport.
pub fn register_unique(tier: &mut Vec<Arc<dyn EventHandler>>, handler: Arc<dyn EventHandler>) {
    if !tier.iter().any(|existing| Arc::ptr_eq(existing, &handler)) {
        tier.push(handler);
    }
}

/// Build the exchange name for an application's events, per the
/// `"<app>.events.exchange"` naming convention.
#[must_use]
pub fn events_exchange_name(app_namespace: &str) -> String {
    format!("{app_namespace}.events.exchange")
}

/// Build the durable queue name for a tagged subscriber of an
/// application's events, per the `"<app>.<tag>.events.queue"` convention.
#[must_use]
pub fn events_queue_name(app_namespace: &str, consumer_tag: &str) -> String {
    format!("{app_namespace}.{consumer_tag}.events.queue")
}
