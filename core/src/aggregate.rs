//! Aggregate trait and the shared `AggregateRoot` base.

use crate::error::DomainError;
use crate::event::Event;
use crate::identifier::Identifier;
use crate::version::Version;

/// Fields shared by every aggregate: identity and the version it was loaded
/// at or has advanced to.
///
/// # Composition over Inheritance
///
/// Rust traits cannot carry state, so a common base like this cannot be
/// "inherited" the way an abstract base class would be in an
/// object-oriented runtime. Instead, concrete aggregates embed an
/// `AggregateRoot` field and delegate `id()`/`version()` to it. This keeps
/// aggregate authors from re-deriving identity/version bookkeeping in every
/// aggregate while staying within Rust's composition model.
///
/// # Examples
///
/// ```
/// use ironhorizon_core::aggregate::{Aggregate, AggregateRoot};
/// use ironhorizon_core::command::Command;
/// use ironhorizon_core::error::DomainError;
/// use ironhorizon_core::event::{Event, EventError};
/// use ironhorizon_core::identifier::Identifier;
///
/// #[derive(Debug)]
/// struct Counter {
///     root: AggregateRoot,
///     value: i64,
/// }
///
/// #[derive(Debug)]
/// struct Incremented { counter_id: String }
///
/// impl Event for Incremented {
///     fn aggregate_id(&self) -> String { self.counter_id.clone() }
///     fn aggregate_type(&self) -> &'static str { "Counter" }
///     fn event_type(&self) -> &'static str { "Incremented" }
///     fn to_json(&self) -> Result<serde_json::Value, EventError> {
///         Ok(serde_json::json!({ "counter_id": self.counter_id }))
///     }
/// }
///
/// impl Aggregate for Counter {
///     fn aggregate_type() -> &'static str { "Counter" }
///
///     fn new(id: Identifier) -> Self {
///         Self { root: AggregateRoot::new(id), value: 0 }
///     }
///
///     fn root(&self) -> &AggregateRoot { &self.root }
///     fn root_mut(&mut self) -> &mut AggregateRoot { &mut self.root }
///
///     fn apply(&mut self, event: &dyn Event) {
///         if event.event_type() == "Incremented" {
///             self.value += 1;
///         }
///     }
///
///     fn handle(&mut self, _command: &dyn Command) -> Result<(), DomainError> {
///         self.record_event(Incremented { counter_id: self.root.id().to_string() });
///         Ok(())
///     }
/// }
/// ```
#[derive(Debug)]
pub struct AggregateRoot {
    id: Identifier,
    version: Version,
    uncommitted: Vec<Box<dyn Event>>,
}

impl AggregateRoot {
    /// Start a fresh aggregate root at [`Version::INITIAL`].
    #[must_use]
    pub const fn new(id: Identifier) -> Self {
        Self {
            id,
            version: Version::INITIAL,
            uncommitted: Vec::new(),
        }
    }

    /// Resume a root at an already-known version, as happens after replay.
    #[must_use]
    pub const fn at_version(id: Identifier, version: Version) -> Self {
        Self {
            id,
            version,
            uncommitted: Vec::new(),
        }
    }

    /// The aggregate's identifier.
    #[must_use]
    pub const fn id(&self) -> &Identifier {
        &self.id
    }

    /// The version this aggregate's state reflects.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Advance the tracked version, called once per event during replay or
    /// after a successful append.
    pub fn advance_version(&mut self) {
        self.version = self.version.next();
    }

    /// Set the tracked version directly, called by the repository once an
    /// append has been confirmed by the event store.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Drain and return events recorded since the last save, clearing the
    /// buffer for the next command.
    pub fn take_uncommitted_events(&mut self) -> Vec<Box<dyn Event>> {
        std::mem::take(&mut self.uncommitted)
    }

    /// Whether any events have been recorded since the last save.
    #[must_use]
    pub fn has_uncommitted_events(&self) -> bool {
        !self.uncommitted.is_empty()
    }
}

/// A domain aggregate: the consistency boundary for a set of commands.
///
/// An aggregate is reconstructed by replaying its event stream from the
/// beginning (`new` + repeated `apply`), handles commands by producing new
/// events (`handle`, via [`AggregateRoot::record_event`] below), and is
/// persisted by appending those new events back to the same stream.
pub trait Aggregate: Send + Sync + 'static {
    /// The aggregate type name, e.g. `"Order"`. Used to key the event
    /// store's stream namespace and the command/event bus's routing keys.
    fn aggregate_type() -> &'static str
    where
        Self: Sized;

    /// Construct a new, empty aggregate instance ready to have events
    /// applied to it during replay.
    fn new(id: Identifier) -> Self
    where
        Self: Sized;

    /// Borrow the aggregate's base fields.
    fn root(&self) -> &AggregateRoot;

    /// Mutably borrow the aggregate's base fields.
    fn root_mut(&mut self) -> &mut AggregateRoot;

    /// Apply a single historical event to mutate state.
    ///
    /// Called once per event during replay (oldest first), and once more,
    /// immediately, for each new event a command handler records — so that a
    /// handler's own subsequent logic in the same invocation sees up-to-date
    /// state. `apply` must never fail: by the time an event reaches this
    /// point it has already happened and cannot be rejected.
    fn apply(&mut self, event: &dyn Event);

    /// Handle a command, recording zero or more events via
    /// [`AggregateRoot::record_event`] through `self.root_mut()`, or
    /// rejecting the command with a [`DomainError`].
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the command is invalid for the
    /// aggregate's current state.
    fn handle(&mut self, command: &dyn Command) -> Result<(), DomainError>;

    /// Record a new event: apply it to `self` immediately and buffer it as
    /// uncommitted so the repository can persist it after `handle` returns.
    ///
    /// This is the single call aggregate authors need inside `handle()`: it
    /// satisfies both "apply to state so later logic in this invocation
    /// sees it" and "append to the stream on save".
    fn record_event<E: Event>(&mut self, event: E)
    where
        Self: Sized,
    {
        self.apply(&event);
        self.root_mut().uncommitted.push(Box::new(event));
    }
}

use crate::command::Command;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventError;

    #[derive(Debug)]
    struct Counter {
        root: AggregateRoot,
        value: i64,
    }

    #[derive(Debug)]
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
    fn record_event_applies_immediately_and_buffers() {
        let mut counter = Counter::new(Identifier::new("c-1"));
        counter.record_event(Incremented {
            counter_id: "c-1".to_string(),
        });

        assert_eq!(counter.value, 1);
        assert!(counter.root().has_uncommitted_events());
        assert_eq!(counter.root_mut().take_uncommitted_events().len(), 1);
        assert!(!counter.root().has_uncommitted_events());
    }

    #[test]
    fn advance_version_increments() {
        let mut root = AggregateRoot::new(Identifier::new("c-1"));
        assert!(root.version().is_initial());
        root.advance_version();
        assert_eq!(root.version(), Version::new(1));
    }
}
