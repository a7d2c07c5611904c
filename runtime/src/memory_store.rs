//! `HashMap`-backed [`EventStore`] for tests and local development.

use ironhorizon_core::event::{Event, EventFactory, EventRecord};
use ironhorizon_core::event_bus::EventBus;
use ironhorizon_core::event_store::{EventAppend, EventStore, EventStoreError};
use ironhorizon_core::identifier::Identifier;
use ironhorizon_core::version::Version;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// An `EventStore` backed by an in-process `HashMap`, guarded by a single
/// mutex.
///
/// Appends are serialized: the whole stream table is locked for the
/// duration of the version check and push, mirroring how
/// `MemoryEventStore.Save` in the Go original plays the role of the
/// database transaction the production store would use. Events are
/// published on the injected [`EventBus`], one at a time, after the lock is
/// released — a publish failure never rolls back or fails the append that
/// already succeeded.
pub struct InMemoryEventStore {
    streams: Mutex<HashMap<Identifier, Vec<EventRecord>>>,
    factories: Mutex<HashMap<String, EventFactory>>,
    event_bus: Option<Arc<dyn EventBus>>,
}

impl InMemoryEventStore {
    /// Create a store with no attached event bus; appended events are
    /// persisted but never published.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            factories: Mutex::new(HashMap::new()),
            event_bus: None,
        }
    }

    /// Create a store that publishes every appended event on `event_bus`.
    #[must_use]
    pub fn with_event_bus(event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            factories: Mutex::new(HashMap::new()),
            event_bus: Some(event_bus),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_events(
        &self,
        appends: Vec<EventAppend>,
    ) -> Pin<
        Box<dyn Future<Output = Result<HashMap<Identifier, Version>, EventStoreError>> + Send + '_>,
    > {
        Box::pin(async move {
            let mut new_versions = HashMap::with_capacity(appends.len());
            let mut published = Vec::new();

            // Each group gets its own CAS under one lock acquisition per
            // group; a failing group stops the whole call, but whatever
            // groups committed before it stay committed.
            for EventAppend {
                stream_id,
                expected_version,
                events,
            } in appends
            {
                let new_version = {
                    let mut streams = self.streams.lock();
                    let stream = streams.entry(stream_id.clone()).or_default();
                    let current_version = Version::new(stream.len() as u64);

                    if let Some(expected) = expected_version {
                        if expected != current_version {
                            return Err(EventStoreError::ConcurrencyConflict {
                                stream_id,
                                expected,
                                actual: current_version,
                            });
                        }
                    }

                    stream.extend(events.iter().cloned());
                    Version::new(stream.len() as u64)
                };

                new_versions.insert(stream_id, new_version);
                published.extend(events);
            }

            if let Some(bus) = &self.event_bus {
                for event in published {
                    // A subscriber failing to handle this event does not
                    // undo the append above; it is already durable.
                    let _ = bus.publish_event(event).await;
                }
            }

            Ok(new_versions)
        })
    }

    fn load_events(
        &self,
        stream_id: Identifier,
        from_version: Option<Version>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EventRecord>, EventStoreError>> + Send + '_>> {
        Box::pin(async move {
            let streams = self.streams.lock();
            let Some(stream) = streams.get(&stream_id) else {
                return Err(EventStoreError::NoEventsFound(stream_id));
            };
            let start = from_version.map_or(0, |v| v.value() as usize);
            Ok(stream.get(start..).unwrap_or_default().to_vec())
        })
    }

    fn register_event_type(
        &self,
        event_type: &str,
        factory: EventFactory,
    ) -> Result<(), EventStoreError> {
        self.factories.lock().insert(event_type.to_string(), factory);
        Ok(())
    }

    fn decode_event(&self, record: &EventRecord) -> Result<Box<dyn Event>, EventStoreError> {
        let factories = self.factories.lock();
        let factory = factories
            .get(&record.event_type)
            .ok_or_else(|| EventStoreError::EventNotRegistered(record.event_type.clone()))?;
        factory(record.payload.clone())
            .map_err(|e| EventStoreError::CouldNotUnmarshal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event_type: &str) -> EventRecord {
        EventRecord::new(event_type.to_string(), serde_json::json!({}), None)
    }

    #[tokio::test]
    async fn append_to_fresh_stream_starts_at_zero() {
        let store = InMemoryEventStore::new();
        let id = Identifier::new("order-1");

        let versions = store
            .append_events(vec![EventAppend::new(
                id.clone(),
                Some(Version::INITIAL),
                vec![record("OrderPlaced")],
            )])
            .await
            .expect("append should succeed");

        assert_eq!(versions.get(&id), Some(&Version::new(1)));
    }

    #[tokio::test]
    async fn concurrent_append_with_stale_version_is_rejected() {
        let store = InMemoryEventStore::new();
        let id = Identifier::new("order-1");

        store
            .append_events(vec![EventAppend::new(
                id.clone(),
                Some(Version::INITIAL),
                vec![record("OrderPlaced")],
            )])
            .await
            .expect("first append should succeed");

        let result = store
            .append_events(vec![EventAppend::new(
                id,
                Some(Version::INITIAL),
                vec![record("OrderCancelled")],
            )])
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn append_events_across_two_aggregates_in_one_call() {
        let store = InMemoryEventStore::new();
        let first = Identifier::new("order-1");
        let second = Identifier::new("order-2");

        let versions = store
            .append_events(vec![
                EventAppend::new(first.clone(), Some(Version::INITIAL), vec![record("A")]),
                EventAppend::new(second.clone(), Some(Version::INITIAL), vec![record("B")]),
            ])
            .await
            .expect("append should succeed");

        assert_eq!(versions.get(&first), Some(&Version::new(1)));
        assert_eq!(versions.get(&second), Some(&Version::new(1)));
    }

    #[tokio::test]
    async fn append_events_stops_at_first_failing_group_but_keeps_earlier_commits() {
        let store = InMemoryEventStore::new();
        let first = Identifier::new("order-1");
        let second = Identifier::new("order-2");

        let result = store
            .append_events(vec![
                EventAppend::new(first.clone(), Some(Version::INITIAL), vec![record("A")]),
                // Wrong expected version: this group fails.
                EventAppend::new(second.clone(), Some(Version::new(1)), vec![record("B")]),
            ])
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));

        let first_events = store
            .load_events(first, None)
            .await
            .expect("first group committed before the second failed");
        assert_eq!(first_events.len(), 1);

        let second_result = store.load_events(second, None).await;
        assert!(matches!(second_result, Err(EventStoreError::NoEventsFound(_))));
    }

    #[tokio::test]
    async fn load_events_returns_no_events_found_for_unknown_stream() {
        let store = InMemoryEventStore::new();
        let result = store.load_events(Identifier::new("missing"), None).await;
        assert!(matches!(result, Err(EventStoreError::NoEventsFound(_))));
    }

    #[tokio::test]
    async fn load_events_respects_from_version() {
        let store = InMemoryEventStore::new();
        let id = Identifier::new("order-1");
        store
            .append_events(vec![EventAppend::new(
                id.clone(),
                Some(Version::INITIAL),
                vec![record("A"), record("B"), record("C")],
            )])
            .await
            .expect("append should succeed");

        let events = store
            .load_events(id, Some(Version::new(1)))
            .await
            .expect("load should succeed");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "B");
    }

    #[test]
    fn decode_event_fails_without_registration() {
        let store = InMemoryEventStore::new();
        let result = store.decode_event(&record("Unregistered"));
        assert!(matches!(
            result,
            Err(EventStoreError::EventNotRegistered(_))
        ));
    }
}
