//! Property tests for the invariants `InMemoryEventStore` and
//! `AggregateRepository` must hold regardless of how many events a stream
//! accumulates: version monotonicity, replay identity, load round-tripping,
//! and optimistic concurrency under a race.

use ironhorizon_core::event::{Event, EventError, EventRecord};
use ironhorizon_core::event_store::{EventAppend, EventStore, EventStoreError};
use ironhorizon_core::identifier::Identifier;
use ironhorizon_core::version::Version;
use ironhorizon_runtime::InMemoryEventStore;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Counted {
    counter_id: String,
    seq: u64,
}

impl Event for Counted {
    fn aggregate_id(&self) -> String {
        self.counter_id.clone()
    }
    fn aggregate_type(&self) -> &'static str {
        "Counter"
    }
    fn event_type(&self) -> &'static str {
        "Counted"
    }
    fn to_json(&self) -> Result<serde_json::Value, EventError> {
        Ok(serde_json::json!({ "counter_id": self.counter_id, "seq": self.seq }))
    }
}

fn decode_counted(payload: serde_json::Value) -> Result<Box<dyn Event>, EventError> {
    let counter_id = payload
        .get("counter_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| EventError::Deserialization("missing counter_id".to_string()))?
        .to_string();
    let seq = payload
        .get("seq")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| EventError::Deserialization("missing seq".to_string()))?;
    Ok(Box::new(Counted { counter_id, seq }))
}

fn records(count: u64) -> Vec<EventRecord> {
    (0..count)
        .map(|seq| {
            EventRecord::from_event(
                &Counted {
                    counter_id: "c-1".to_string(),
                    seq,
                },
                None,
            )
            .expect("test fixture events must serialize")
        })
        .collect()
}

proptest! {
    /// Appending `n` events to a fresh stream always advances its version
    /// by exactly `n`, regardless of `n`.
    #[test]
    fn version_advances_by_exactly_the_events_appended(n in 0u64..50) {
        let runtime = tokio::runtime::Runtime::new().expect("runtime should build");
        runtime.block_on(async {
            let store = InMemoryEventStore::new();
            let id = Identifier::new("c-1");
            let versions = store
                .append_events(vec![EventAppend::new(id.clone(), Some(Version::INITIAL), records(n))])
                .await
                .expect("append should succeed");
            prop_assert_eq!(versions.get(&id).copied(), Some(Version::new(n)));
            Ok(())
        })?;
    }

    /// Loading a stream back returns events in the same order they were
    /// appended, with the same payload content, no matter how many there
    /// are.
    #[test]
    fn load_round_trips_every_appended_event(n in 1u64..50) {
        let runtime = tokio::runtime::Runtime::new().expect("runtime should build");
        runtime.block_on(async {
            let store = InMemoryEventStore::new();
            store
                .register_event_type("Counted", decode_counted)
                .expect("registration should succeed");
            let id = Identifier::new("c-1");
            store
                .append_events(vec![EventAppend::new(id.clone(), Some(Version::INITIAL), records(n))])
                .await
                .expect("append should succeed");

            let loaded = store
                .load_events(id, None)
                .await
                .expect("load should succeed");
            prop_assert_eq!(loaded.len() as u64, n);

            for (i, record) in loaded.iter().enumerate() {
                let event = store.decode_event(record).expect("decode should succeed");
                let seq = event
                    .to_json()
                    .expect("serialize should succeed")
                    .get("seq")
                    .and_then(serde_json::Value::as_u64)
                    .expect("seq should be present");
                prop_assert_eq!(seq, i as u64);
            }
            Ok(())
        })?;
    }

    /// Replaying the same stream twice, independently, produces the same
    /// sequence of decoded events both times — replay has no hidden
    /// dependence on when or how often it runs.
    #[test]
    fn replay_is_idempotent(n in 0u64..50) {
        let runtime = tokio::runtime::Runtime::new().expect("runtime should build");
        runtime.block_on(async {
            let store = InMemoryEventStore::new();
            store
                .register_event_type("Counted", decode_counted)
                .expect("registration should succeed");
            let id = Identifier::new("c-1");
            store
                .append_events(vec![EventAppend::new(id.clone(), Some(Version::INITIAL), records(n))])
                .await
                .expect("append should succeed");

            let first = store.load_events(id.clone(), None).await.expect("first load should succeed");
            let second = store.load_events(id, None).await.expect("second load should succeed");

            prop_assert_eq!(first.len(), second.len());
            for (a, b) in first.iter().zip(second.iter()) {
                prop_assert_eq!(&a.event_type, &b.event_type);
                prop_assert_eq!(&a.payload, &b.payload);
            }
            Ok(())
        })?;
    }
}

/// Two writers racing to append to the same stream with the same expected
/// version: exactly one succeeds, the other sees a concurrency conflict,
/// and the stream ends up holding exactly one writer's events, never both
/// or neither.
#[tokio::test]
async fn racing_appends_with_the_same_expected_version_conflict() {
    let store = Arc::new(InMemoryEventStore::new());
    let id = Identifier::new("c-1");

    let store_a = Arc::clone(&store);
    let id_a = id.clone();
    let writer_a = tokio::spawn(async move {
        store_a
            .append_events(vec![EventAppend::new(id_a, Some(Version::INITIAL), records(1))])
            .await
    });

    let store_b = Arc::clone(&store);
    let id_b = id.clone();
    let writer_b = tokio::spawn(async move {
        store_b
            .append_events(vec![EventAppend::new(id_b, Some(Version::INITIAL), records(1))])
            .await
    });

    let (result_a, result_b) = tokio::join!(writer_a, writer_b);
    let result_a = result_a.expect("task should not panic");
    let result_b = result_b.expect("task should not panic");

    let successes = [&result_a, &result_b]
        .into_iter()
        .filter(|r| r.is_ok())
        .count();
    let conflicts = [&result_a, &result_b]
        .into_iter()
        .filter(|r| matches!(r, Err(EventStoreError::ConcurrencyConflict { .. })))
        .count();

    assert_eq!(successes, 1, "exactly one racing writer should win");
    assert_eq!(conflicts, 1, "the other writer should see a conflict");

    let events = store
        .load_events(id, None)
        .await
        .expect("load should succeed");
    assert_eq!(events.len(), 1, "only the winning writer's event is persisted");
}
