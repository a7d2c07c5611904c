//! Event store trait: append-only, per-aggregate event persistence with
//! optimistic concurrency control.
//!
//! # Design
//!
//! The store is deliberately narrow. It does not know about aggregates,
//! commands, or projections — it persists and returns [`EventRecord`]s
//! keyed by stream [`Identifier`], nothing more. Everything above that
//! (replaying events into aggregate state, routing commands, building read
//! models) lives in [`crate::aggregate`], [`crate::command_bus`] and the
//! `ironhorizon-runtime`/`ironhorizon-projections` crates.
//!
//! # Implementations
//!
//! - `InMemoryEventStore` (`ironhorizon-runtime`): `HashMap`-backed, for
//!   tests and local development.
//! - A broker-agnostic durable store is intentionally not shipped by this
//!   crate; concrete database drivers are out of scope (see the crate's
//!   non-goals).

use crate::event::{Event, EventFactory, EventRecord};
use crate::identifier::Identifier;
use crate::version::Version;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during event store operations.
#[derive(Error, Debug, Clone)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict: the caller's expected version no
    /// longer matches the stream's actual current version.
    ///
    /// This means another writer appended to the same stream first. The
    /// caller should reload the aggregate and retry the command.
    #[error("concurrency conflict on stream {stream_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The stream where the conflict occurred.
        stream_id: Identifier,
        /// The version the caller expected the stream to be at.
        expected: Version,
        /// The stream's actual current version.
        actual: Version,
    },

    /// No factory was registered for an event type encountered while
    /// reconstructing events from storage.
    #[error("event type not registered: {0}")]
    EventNotRegistered(String),

    /// Events could not be serialized before being persisted.
    #[error("could not marshal event: {0}")]
    CouldNotMarshal(String),

    /// Events could not be deserialized after being read back.
    #[error("could not unmarshal event: {0}")]
    CouldNotUnmarshal(String),

    /// The underlying storage backend failed.
    #[error("storage error: {0}")]
    StorageError(String),

    /// `load_events` found no record for the requested stream.
    ///
    /// Not necessarily a problem: the repository translates this into a
    /// fresh, version-0 aggregate rather than propagating it, since "no
    /// events yet" and "aggregate does not exist yet" are the same thing
    /// from this store's point of view.
    #[error("no events found for stream {0}")]
    NoEventsFound(Identifier),
}

/// One aggregate's events and concurrency token within a single
/// [`EventStore::append_events`] call.
///
/// A call takes a list of these rather than one flat stream id plus one
/// flat event list so it can accept a heterogeneous batch spanning more
/// than one `aggregate_id` in one round trip: the store groups by
/// `stream_id` and runs one CAS per group, per the spec's "callers may
/// pass a heterogeneous list; implementations MUST group by `aggregate_id`"
/// contract. Callers saving a single aggregate pass a one-element `Vec`.
#[derive(Debug, Clone)]
pub struct EventAppend {
    /// The stream this group of events belongs to.
    pub stream_id: Identifier,
    /// The compare-and-swap token for this stream; see
    /// [`EventStore::append_events`].
    pub expected_version: Option<Version>,
    /// The events to append to `stream_id`, oldest first.
    pub events: Vec<EventRecord>,
}

impl EventAppend {
    /// Build an append group for one stream.
    #[must_use]
    pub const fn new(
        stream_id: Identifier,
        expected_version: Option<Version>,
        events: Vec<EventRecord>,
    ) -> Self {
        Self {
            stream_id,
            expected_version,
            events,
        }
    }
}

/// Append-only, per-aggregate event persistence with optimistic concurrency.
///
/// # Dyn Compatibility
///
/// This trait returns `Pin<Box<dyn Future>>` rather than using `async fn` so
/// that it remains object-safe: the repository and command dispatcher hold
/// their store behind `Arc<dyn EventStore>` so that in-memory and
/// broker-backed implementations can be swapped without generic parameters
/// propagating through every layer above them.
pub trait EventStore: Send + Sync {
    /// Append one or more aggregates' events in a single call, enforcing
    /// optimistic concurrency independently per `stream_id` group.
    ///
    /// Each [`EventAppend`]'s `expected_version` is the compare-and-swap
    /// token for its own stream: the caller asserts that stream is
    /// currently at this version. If a stream has moved on (another writer
    /// appended first), its group fails with
    /// [`EventStoreError::ConcurrencyConflict`] and none of that group's
    /// events are persisted. Groups are processed in argument order; if one
    /// group fails, processing stops there — groups already committed stay
    /// committed (a known partial-failure edge callers avoid by saving only
    /// one aggregate at a time unless they are prepared to reload and
    /// reconcile). On full success, returns each group's new version keyed
    /// by `stream_id`, and publishes every appended event afterward, in the
    /// order groups and events appear in the call.
    ///
    /// Passing `expected_version: None` for a group appends it
    /// unconditionally with no concurrency check, which is only
    /// appropriate for streams known not to be written concurrently (e.g.
    /// one-shot test fixtures).
    ///
    /// # Errors
    ///
    /// - [`EventStoreError::ConcurrencyConflict`] on a version mismatch in
    ///   any group.
    /// - [`EventStoreError::CouldNotMarshal`] if an event fails to serialize.
    /// - [`EventStoreError::StorageError`] if the backend fails.
    fn append_events(
        &self,
        appends: Vec<EventAppend>,
    ) -> Pin<
        Box<dyn Future<Output = Result<HashMap<Identifier, Version>, EventStoreError>> + Send + '_>,
    >;

    /// Load a stream's events from a starting version (inclusive), oldest
    /// first.
    ///
    /// `from_version: None` loads the whole stream.
    ///
    /// # Errors
    ///
    /// - [`EventStoreError::NoEventsFound`] if no record exists for
    ///   `stream_id`.
    /// - [`EventStoreError::CouldNotUnmarshal`] if a stored event fails to
    ///   deserialize.
    /// - [`EventStoreError::StorageError`] if the backend fails.
    fn load_events(
        &self,
        stream_id: Identifier,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EventRecord>, EventStoreError>> + Send + '_>>;

    /// Register a factory so this store can reconstruct boxed [`crate::event::Event`]
    /// values for a given `event_type` string.
    ///
    /// # Errors
    ///
    /// Implementations may return an error if the event type is already
    /// registered with a conflicting factory; the default in-memory store
    /// treats re-registration with the same factory as a no-op.
    fn register_event_type(
        &self,
        event_type: &str,
        factory: EventFactory,
    ) -> Result<(), EventStoreError>;

    /// Reconstruct a boxed [`Event`] from a stored record, using the
    /// factory registered for its `event_type`.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::EventNotRegistered`] if no factory was
    /// registered for `record.event_type`, or
    /// [`EventStoreError::CouldNotUnmarshal`] if the registered factory
    /// fails to parse the payload.
    fn decode_event(&self, record: &EventRecord) -> Result<Box<dyn Event>, EventStoreError>;
}
