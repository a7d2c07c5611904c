//! Aggregate repository: loads aggregates by replaying their event stream,
//! saves them by appending newly recorded events.

use crate::error::RuntimeError;
use ironhorizon_core::aggregate::Aggregate;
use ironhorizon_core::event::EventRecord;
use ironhorizon_core::event_store::{EventAppend, EventStore, EventStoreError};
use ironhorizon_core::identifier::Identifier;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Constructs a fresh, empty aggregate instance ready for replay.
///
/// Registered per `aggregate_type` so the repository can construct the
/// right concrete aggregate without a generic type parameter on every one
/// of its methods.
pub type AggregateFactory = fn(Identifier) -> Box<dyn Aggregate>;

/// Loads aggregates by replaying their event stream from an [`EventStore`],
/// and persists them by appending newly recorded events back to it.
pub struct AggregateRepository<S: EventStore> {
    store: S,
    factories: Mutex<HashMap<&'static str, AggregateFactory>>,
}

impl<S: EventStore> AggregateRepository<S> {
    /// Create a repository backed by `store`, with no aggregate types
    /// registered yet.
    pub fn new(store: S) -> Self {
        Self {
            store,
            factories: Mutex::new(HashMap::new()),
        }
    }

    /// Register the factory used to construct a fresh instance of
    /// `aggregate_type` before replay.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AggregateAlreadySet`] if `aggregate_type` is
    /// already registered.
    pub fn register_aggregate(
        &self,
        aggregate_type: &'static str,
        factory: AggregateFactory,
    ) -> Result<(), RuntimeError> {
        let mut factories = self.factories.lock();
        if factories.contains_key(aggregate_type) {
            return Err(RuntimeError::AggregateAlreadySet(
                aggregate_type.to_string(),
            ));
        }
        factories.insert(aggregate_type, factory);
        Ok(())
    }

    /// Load an aggregate instance by replaying its event stream.
    ///
    /// An `id` with no events yet is not an error: the store's
    /// `load_events` reports [`EventStoreError::NoEventsFound`] for an
    /// unknown stream, and this method translates that into a fresh,
    /// version-0 aggregate rather than propagating it, since "no events
    /// yet" and "aggregate does not exist yet" are the same thing from the
    /// caller's point of view.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::AggregateNotFound`] if no factory is
    /// registered for `aggregate_type`, or propagates an
    /// [`ironhorizon_core::EventStoreError`] (other than `NoEventsFound`)
    /// if replay fails.
    #[tracing::instrument(skip(self), fields(aggregate_type, %id))]
    pub async fn load(
        &self,
        aggregate_type: &'static str,
        id: Identifier,
    ) -> Result<Box<dyn Aggregate>, RuntimeError> {
        let factory = {
            let factories = self.factories.lock();
            *factories
                .get(aggregate_type)
                .ok_or_else(|| RuntimeError::AggregateNotFound(aggregate_type.to_string()))?
        };

        let mut aggregate = factory(id.clone());
        let events = match self.store.load_events(id, None).await {
            Ok(events) => events,
            Err(EventStoreError::NoEventsFound(_)) => Vec::new(),
            Err(error) => return Err(error.into()),
        };

        tracing::debug!(event_count = events.len(), "replaying events");

        for record in &events {
            let event = self.store.decode_event(record)?;
            aggregate.apply(event.as_ref());
            aggregate.root_mut().advance_version();
        }

        Ok(aggregate)
    }

    /// Persist an aggregate's newly recorded events.
    ///
    /// A no-op if the aggregate has no uncommitted events. On success, the
    /// aggregate's tracked version is advanced to match the store's
    /// confirmed version.
    ///
    /// # Errors
    ///
    /// Propagates [`ironhorizon_core::EventStoreError::ConcurrencyConflict`]
    /// if another writer appended to the same stream first.
    #[tracing::instrument(skip(self, aggregate), fields(id = %aggregate.root().id()))]
    pub async fn save(&self, aggregate: &mut dyn Aggregate) -> Result<(), RuntimeError> {
        let Some(append) = Self::build_append(aggregate)? else {
            return Ok(());
        };
        let id = append.stream_id.clone();

        let mut versions = self.store.append_events(vec![append]).await?;
        let new_version = versions
            .remove(&id)
            .expect("append_events returns a version for every group it was given");

        aggregate.root_mut().set_version(new_version);
        tracing::debug!(new_version = new_version.value(), "saved events");
        Ok(())
    }

    /// Persist several aggregates' newly recorded events in a single
    /// [`EventStore::append_events`] call.
    ///
    /// Aggregates with no uncommitted events are skipped and left
    /// untouched. Groups are appended in the order `aggregates` is given;
    /// if one group's CAS fails, the call fails and earlier groups in this
    /// call stay committed, matching [`EventStore::append_events`]'s
    /// partial-failure contract — callers whose aggregates must all commit
    /// together or not at all should save them one at a time instead.
    ///
    /// # Errors
    ///
    /// Propagates [`ironhorizon_core::EventStoreError::ConcurrencyConflict`]
    /// if any aggregate's stream moved on since it was loaded.
    #[tracing::instrument(skip(self, aggregates))]
    pub async fn save_all(
        &self,
        aggregates: &mut [&mut dyn Aggregate],
    ) -> Result<(), RuntimeError> {
        let mut appends = Vec::with_capacity(aggregates.len());
        for aggregate in aggregates.iter_mut() {
            if let Some(append) = Self::build_append(*aggregate)? {
                appends.push(append);
            }
        }
        if appends.is_empty() {
            return Ok(());
        }
        let saved_count = appends.len();

        let mut versions = self.store.append_events(appends).await?;
        for aggregate in aggregates.iter_mut() {
            let id = aggregate.root().id().clone();
            if let Some(new_version) = versions.remove(&id) {
                aggregate.root_mut().set_version(new_version);
            }
        }
        tracing::debug!(aggregate_count = saved_count, "saved events for multiple aggregates");
        Ok(())
    }

    /// Build this aggregate's pending [`EventAppend`] group, or `None` if it
    /// has no uncommitted events to save.
    fn build_append(aggregate: &mut dyn Aggregate) -> Result<Option<EventAppend>, RuntimeError> {
        let expected_version = aggregate.root().version();
        let events = aggregate.root_mut().take_uncommitted_events();
        if events.is_empty() {
            return Ok(None);
        }

        let records = events
            .iter()
            .map(|event| EventRecord::from_event(event.as_ref(), None))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| EventStoreError::CouldNotMarshal(e.to_string()))?;

        let id = aggregate.root().id().clone();
        Ok(Some(EventAppend::new(id, Some(expected_version), records)))
    }
}
