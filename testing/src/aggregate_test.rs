//! Given-When-Then harness for testing aggregate command handling in
//! isolation, without an event store, bus, or dispatcher in the loop.

#![allow(clippy::panic)] // Test assertions intentionally panic on mismatch

use ironhorizon_core::aggregate::Aggregate;
use ironhorizon_core::command::Command;
use ironhorizon_core::error::DomainError;
use ironhorizon_core::event::{Event, EventRecord};
use ironhorizon_core::identifier::Identifier;

/// Fluent Given-When-Then test for one aggregate's command handling.
///
/// # Example
///
/// ```ignore
/// use ironhorizon_testing::AggregateTest;
///
/// AggregateTest::<Invitation>::given(Identifier::new("inv-1"), vec![])
///     .when(&CreateInvite { invitation_id: "inv-1".into(), guest_name: "Ada".into() })
///     .then_ok()
///     .then_events(|events| assert_eq!(events.len(), 1));
/// ```
pub struct AggregateTest<A: Aggregate> {
    aggregate: A,
}

impl<A: Aggregate> AggregateTest<A> {
    /// Construct a fresh aggregate at `id` and replay `history` onto it, as
    /// the repository would after loading an existing stream.
    #[must_use]
    pub fn given(id: Identifier, history: Vec<Box<dyn Event>>) -> Self {
        let mut aggregate = A::new(id);
        for event in &history {
            aggregate.apply(event.as_ref());
            aggregate.root_mut().advance_version();
        }
        Self { aggregate }
    }

    /// Construct a fresh aggregate at `id` with no prior history.
    #[must_use]
    pub fn given_none(id: Identifier) -> Self {
        Self::given(id, Vec::new())
    }

    /// Run `command` through `validate()` then `handle()`, mirroring the
    /// order `ironhorizon_runtime::CommandDispatcher` enforces: an invalid
    /// command never reaches the aggregate at all.
    #[must_use]
    pub fn when(mut self, command: &dyn Command) -> AggregateTestOutcome<A> {
        let result = command
            .validate()
            .and_then(|()| self.aggregate.handle(command));

        let recorded = self
            .aggregate
            .root_mut()
            .take_uncommitted_events()
            .iter()
            .map(|event| {
                #[allow(clippy::expect_used)]
                EventRecord::from_event(event.as_ref(), None)
                    .expect("test fixture events must serialize")
            })
            .collect();

        AggregateTestOutcome {
            aggregate: self.aggregate,
            result,
            recorded,
        }
    }
}

/// The result of running a command through [`AggregateTest::when`], with
/// assertion methods that consume and return `self` for chaining.
pub struct AggregateTestOutcome<A: Aggregate> {
    aggregate: A,
    result: Result<(), DomainError>,
    recorded: Vec<EventRecord>,
}

impl<A: Aggregate> AggregateTestOutcome<A> {
    /// Assert that `handle()` succeeded.
    ///
    /// # Panics
    ///
    /// Panics if `handle()` returned an error.
    #[must_use]
    pub fn then_ok(self) -> Self {
        assert!(
            self.result.is_ok(),
            "expected command to be accepted, got {:?}",
            self.result
        );
        self
    }

    /// Assert that `handle()` (or validation) rejected the command, and run
    /// `assertion` against the error.
    ///
    /// # Panics
    ///
    /// Panics if the command was accepted.
    #[must_use]
    pub fn then_err(self, assertion: impl FnOnce(&DomainError)) -> Self {
        match &self.result {
            Ok(()) => panic!("expected command to be rejected, but it was accepted"),
            Err(error) => assertion(error),
        }
        self
    }

    /// Run `assertion` against the events recorded by this command, in
    /// order.
    #[must_use]
    pub fn then_events(self, assertion: impl FnOnce(&[EventRecord])) -> Self {
        assertion(&self.recorded);
        self
    }

    /// Run `assertion` against the aggregate's state after `handle()`.
    #[must_use]
    pub fn then_state(self, assertion: impl FnOnce(&A)) -> Self {
        assertion(&self.aggregate);
        self
    }

    /// Consume the outcome, returning the aggregate for further inspection.
    #[must_use]
    pub fn into_aggregate(self) -> A {
        self.aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironhorizon_core::aggregate::AggregateRoot;
    use ironhorizon_core::event::EventError;

    #[derive(Debug)]
    struct Counter {
        root: AggregateRoot,
        value: i64,
    }

    #[derive(Debug, Clone)]
    struct Incremented {
        counter_id: String,
    }

    impl Event for Incremented {
        fn aggregate_id(&self) -> String {
            self.counter_id.clone()
        }
        fn aggregate_type(&self) -> &'static str {
            "Counter"
        }
        fn event_type(&self) -> &'static str {
            "Incremented"
        }
        fn to_json(&self) -> Result<serde_json::Value, EventError> {
            Ok(serde_json::json!({ "counter_id": self.counter_id }))
        }
    }

    #[derive(Debug)]
    struct Increment {
        counter_id: String,
    }

    impl Command for Increment {
        fn aggregate_id(&self) -> String {
            self.counter_id.clone()
        }
        fn aggregate_type(&self) -> &'static str {
            "Counter"
        }
        fn command_type(&self) -> &'static str {
            "Increment"
        }
        fn validate(&self) -> Result<(), DomainError> {
            if self.counter_id.is_empty() {
                return Err(DomainError::MissingField {
                    field: "counter_id",
                });
            }
            Ok(())
        }
        fn to_json(&self) -> Result<serde_json::Value, DomainError> {
            Ok(serde_json::json!({ "counter_id": self.counter_id }))
        }
    }

    impl Aggregate for Counter {
        fn aggregate_type() -> &'static str {
            "Counter"
        }
        fn new(id: Identifier) -> Self {
            Self {
                root: AggregateRoot::new(id),
                value: 0,
            }
        }
        fn root(&self) -> &AggregateRoot {
            &self.root
        }
        fn root_mut(&mut self) -> &mut AggregateRoot {
            &mut self.root
        }
        fn apply(&mut self, event: &dyn Event) {
            if event.event_type() == "Incremented" {
                self.value += 1;
            }
        }
        fn handle(&mut self, _command: &dyn Command) -> Result<(), DomainError> {
            let id = self.root.id().to_string();
            self.record_event(Incremented { counter_id: id });
            Ok(())
        }
    }

    #[test]
    fn incrementing_a_fresh_counter_records_one_event() {
        AggregateTest::<Counter>::given_none(Identifier::new("c-1"))
            .when(&Increment {
                counter_id: "c-1".to_string(),
            })
            .then_ok()
            .then_events(|events| {
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].event_type, "Incremented");
            })
            .then_state(|counter| assert_eq!(counter.value, 1));
    }

    #[test]
    fn replayed_history_is_visible_before_the_command_runs() {
        AggregateTest::<Counter>::given(
            Identifier::new("c-1"),
            vec![Box::new(Incremented {
                counter_id: "c-1".to_string(),
            })],
        )
        .when(&Increment {
            counter_id: "c-1".to_string(),
        })
        .then_state(|counter| assert_eq!(counter.value, 2));
    }

    #[test]
    fn invalid_command_is_rejected_before_handle_runs() {
        AggregateTest::<Counter>::given_none(Identifier::new("c-1"))
            .when(&Increment {
                counter_id: String::new(),
            })
            .then_err(|error| {
                assert_eq!(
                    error,
                    &DomainError::MissingField {
                        field: "counter_id"
                    }
                );
            })
            .then_events(|events| assert!(events.is_empty()))
            .then_state(|counter| assert_eq!(counter.value, 0));
    }
}
