//! Capturing test doubles for [`EventBus`] and [`CommandBus`].
//!
//! `ironhorizon-runtime` already ships production-capable in-memory
//! implementations (`InMemoryEventStore`, `InProcessEventBus`) that are
//! perfectly usable in tests as-is. These doubles exist for the narrower
//! case of testing a caller that publishes to a bus without wanting to
//! exercise any real fan-out or routing: they simply record what was
//! published/dispatched so a test can assert on it directly.

use ironhorizon_core::command::Command;
use ironhorizon_core::command_bus::{CommandBus, CommandBusError};
use ironhorizon_core::event::EventRecord;
use ironhorizon_core::event_bus::{EventBus, EventBusError, EventHandler};
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// An [`EventBus`] that records every published event instead of
/// dispatching it anywhere.
///
/// Registering handlers is accepted (so code under test can call
/// `add_typed_handler`/`add_local_handler`/`add_global_handler` without
/// erroring) but those handlers are never invoked — this double is for
/// asserting on *what was published*, not on delivery.
#[derive(Default)]
pub struct CapturingEventBus {
    published: Mutex<Vec<EventRecord>>,
}

impl CapturingEventBus {
    /// Create an empty capturing bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The events published so far, oldest first.
    #[must_use]
    pub fn published(&self) -> Vec<EventRecord> {
        self.published.lock().clone()
    }

    /// The number of events published so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.published.lock().len()
    }

    /// Whether no events have been published yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.published.lock().is_empty()
    }
}

impl EventBus for CapturingEventBus {
    fn publish_event(
        &self,
        event: EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        self.published.lock().push(event);
        Box::pin(async { Ok(()) })
    }

    fn add_typed_handler(
        &self,
        _event_type: &'static str,
        _handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError> {
        Ok(())
    }

    fn add_local_handler(&self, _handler: Arc<dyn EventHandler>) -> Result<(), EventBusError> {
        Ok(())
    }

    fn add_global_handler(&self, _handler: Arc<dyn EventHandler>) -> Result<(), EventBusError> {
        Ok(())
    }
}

/// A [`CommandBus`] that records every dispatched/published command instead
/// of routing it to a handler.
#[derive(Default)]
pub struct CapturingCommandBus {
    handled: Mutex<Vec<&'static str>>,
    published: Mutex<Vec<&'static str>>,
}

impl CapturingCommandBus {
    /// Create an empty capturing bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `command_type`s passed to `handle_command`, oldest first.
    #[must_use]
    pub fn handled(&self) -> Vec<&'static str> {
        self.handled.lock().clone()
    }

    /// The `command_type`s passed to `publish_command`, oldest first.
    #[must_use]
    pub fn published(&self) -> Vec<&'static str> {
        self.published.lock().clone()
    }
}

impl CommandBus for CapturingCommandBus {
    fn set_handler(
        &self,
        _command_type: &'static str,
        _handler: Arc<dyn ironhorizon_core::command_bus::CommandHandler>,
    ) -> Result<(), CommandBusError> {
        Ok(())
    }

    fn handle_command(
        &self,
        command: Box<dyn Command>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>> {
        self.handled.lock().push(command.command_type());
        Box::pin(async { Ok(()) })
    }

    fn publish_command(
        &self,
        command: Box<dyn Command>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>> {
        self.published.lock().push(command.command_type());
        Box::pin(async { Ok(()) })
    }
}
