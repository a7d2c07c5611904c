//! Event trait and related types for event sourcing.
//!
//! Events represent immutable facts about things that have already happened.
//! They are the source of truth in an event-sourced system: an aggregate's
//! current state is nothing more than the fold of every event ever recorded
//! against it.
//!
//! # Design
//!
//! Events are serialized to `serde_json::Value` rather than a binary format.
//! JSON keeps events human-readable in the event store and broker payloads,
//! which matters more here than raw throughput: this runtime favors
//! inspectable audit logs over maximum serialization speed.
//!
//! # Example
//!
//! ```
//! use ironhorizon_core::event::{Event, EventError};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Clone, Debug, Serialize, Deserialize)]
//! struct OrderPlaced {
//!     order_id: String,
//!     total_cents: u64,
//! }
//!
//! impl Event for OrderPlaced {
//!     fn aggregate_id(&self) -> String {
//!         self.order_id.clone()
//!     }
//!
//!     fn aggregate_type(&self) -> &'static str {
//!         "Order"
//!     }
//!
//!     fn event_type(&self) -> &'static str {
//!         "OrderPlaced"
//!     }
//!
//!     fn to_json(&self) -> Result<serde_json::Value, EventError> {
//!         serde_json::to_value(self).map_err(|e| EventError::Serialization(e.to_string()))
//!     }
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Errors that can occur while serializing or deserializing events.
#[derive(Error, Debug, Clone)]
pub enum EventError {
    /// The event could not be serialized to JSON.
    #[error("failed to serialize event: {0}")]
    Serialization(String),

    /// The event payload could not be deserialized into the target type.
    #[error("failed to deserialize event: {0}")]
    Deserialization(String),

    /// No factory was registered for this event type.
    ///
    /// Raised when the event bus or event store tries to reconstruct an
    /// event from its wire representation but the caller never registered
    /// an [`EventFactory`] for that `event_type`.
    #[error("no factory registered for event type: {0}")]
    UnknownEventType(String),
}

/// An event that can be appended to an event store and replayed to
/// reconstruct aggregate state.
///
/// # Dyn Compatibility
///
/// `Event` is implemented by many unrelated concrete types, and the runtime
/// passes events around as `Box<dyn Event>` (inside [`EventRecord`], across
/// the event bus, and through aggregate replay). A generic `Serialize` bound
/// directly on the trait would make it non-object-safe, so serialization is
/// exposed instead as a plain method, `to_json`, whose `Self: Serialize`
/// requirement lives on the concrete impl rather than the trait signature.
pub trait Event: Send + Sync + fmt::Debug + 'static {
    /// The identifier of the aggregate instance this event belongs to.
    fn aggregate_id(&self) -> String;

    /// The aggregate type this event belongs to, e.g. `"Order"`.
    fn aggregate_type(&self) -> &'static str;

    /// A stable type name used to route and store this event, e.g.
    /// `"OrderPlaced"`.
    ///
    /// This string, not the Rust type, is what event stores and brokers key
    /// on: it is the identifier that survives serialization and crosses
    /// process boundaries.
    fn event_type(&self) -> &'static str;

    /// Serialize this event's payload to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if the concrete event cannot be
    /// represented as JSON.
    fn to_json(&self) -> Result<serde_json::Value, EventError>;
}

/// A function that reconstructs a boxed [`Event`] from its JSON payload.
///
/// Event stores and the event bus keep a `event_type -> EventFactory`
/// registry so that events read back from storage or off the wire can be
/// turned back into concrete `Box<dyn Event>` values without reflection.
pub type EventFactory = fn(serde_json::Value) -> Result<Box<dyn Event>, EventError>;

/// An event together with the wire metadata needed to store and replay it.
///
/// This is the event store's and event bus's unit of exchange: concrete
/// domain events are converted to an `EventRecord` before being appended or
/// published, and back again on load or consume.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EventRecord {
    /// The stable type name of the event, e.g. `"OrderPlaced"`.
    pub event_type: String,

    /// The event's JSON-encoded payload.
    pub payload: serde_json::Value,

    /// Optional metadata: correlation id, causation id, user id, and so on.
    pub metadata: Option<serde_json::Value>,
}

impl EventRecord {
    /// Construct a record directly from its wire fields.
    #[must_use]
    pub const fn new(
        event_type: String,
        payload: serde_json::Value,
        metadata: Option<serde_json::Value>,
    ) -> Self {
        Self {
            event_type,
            payload,
            metadata,
        }
    }

    /// Build a record from a concrete event, serializing its payload.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Serialization`] if `event.to_json()` fails.
    pub fn from_event(
        event: &dyn Event,
        metadata: Option<serde_json::Value>,
    ) -> Result<Self, EventError> {
        Ok(Self {
            event_type: event.event_type().to_string(),
            payload: event.to_json()?,
            metadata,
        })
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventRecord {{ type: {} }}", self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct TestEvent {
        id: String,
        value: i32,
    }

    impl Event for TestEvent {
        fn aggregate_id(&self) -> String {
            self.id.clone()
        }

        fn aggregate_type(&self) -> &'static str {
            "Test"
        }

        fn event_type(&self) -> &'static str {
            "TestEvent"
        }

        fn to_json(&self) -> Result<serde_json::Value, EventError> {
            serde_json::to_value(self).map_err(|e| EventError::Serialization(e.to_string()))
        }
    }

    #[test]
    fn event_type_returns_identifier() {
        let event = TestEvent {
            id: "test-1".to_string(),
            value: 42,
        };
        assert_eq!(event.event_type(), "TestEvent");
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn record_from_event_roundtrips_payload() {
        let event = TestEvent {
            id: "test-1".to_string(),
            value: 42,
        };

        let record = EventRecord::from_event(&event, None).expect("serialization should succeed");
        assert_eq!(record.event_type, "TestEvent");

        let decoded: TestEvent =
            serde_json::from_value(record.payload).expect("deserialization should succeed");
        assert_eq!(decoded, event);
    }

    #[test]
    fn record_carries_metadata() {
        let event = TestEvent {
            id: "test-1".to_string(),
            value: 100,
        };
        let metadata = serde_json::json!({ "correlation_id": "corr-456" });

        let record = EventRecord::from_event(&event, Some(metadata.clone()))
            .expect("serialization should succeed");

        assert_eq!(record.metadata, Some(metadata));
    }

    #[test]
    fn record_display() {
        let record = EventRecord::new("TestEvent".to_string(), serde_json::json!({}), None);
        assert!(format!("{record}").contains("TestEvent"));
    }
}
