//! # ironhorizon-testing
//!
//! Shared test harness for applications built on ironhorizon.
//!
//! This crate provides:
//! - [`AggregateTest`]: a fluent Given-When-Then harness for testing an
//!   aggregate's command handling in isolation, without an event store, bus,
//!   or dispatcher in the loop.
//! - [`clock::FixedClock`]: a deterministic clock for stamping test fixture
//!   metadata.
//! - [`doubles::CapturingEventBus`] / [`doubles::CapturingCommandBus`]:
//!   buses that record what was published instead of dispatching it,
//!   useful for asserting on a caller's publish behavior in isolation.
//!
//! `ironhorizon-runtime::InMemoryEventStore` and
//! `ironhorizon-runtime::InProcessEventBus` are themselves already
//! test-and-development-grade implementations; this crate does not
//! duplicate them, only adds the harness and doubles production code has
//! no reason to ship.
//!
//! ## Example
//!
//! ```ignore
//! use ironhorizon_testing::AggregateTest;
//! use ironhorizon_core::identifier::Identifier;
//!
//! AggregateTest::<Invitation>::given_none(Identifier::new("inv-1"))
//!     .when(&CreateInvite { invitation_id: "inv-1".into(), guest_name: "Ada".into() })
//!     .then_ok()
//!     .then_events(|events| assert_eq!(events.len(), 1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate_test;
pub mod clock;
pub mod doubles;

pub use aggregate_test::{AggregateTest, AggregateTestOutcome};
pub use clock::{test_clock, FixedClock};
pub use doubles::{CapturingCommandBus, CapturingEventBus};
