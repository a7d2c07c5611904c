//! `ProjectionManager`: wires a projector's event handler onto an event
//! bus, as either a typed or a global subscription.

use crate::error::ProjectionError;
use ironhorizon_core::event_bus::{EventBus, EventHandler};
use std::sync::Arc;

/// Subscribes projectors onto an [`EventBus`].
///
/// A projector is just an [`EventHandler`] that writes into a
/// [`ironhorizon_core::read_model::ReadModelStore`] as it handles each
/// event; this manager does not wrap or require a specific store, since a
/// projector is free to maintain whatever read model shape it needs.
pub struct ProjectionManager {
    event_bus: Arc<dyn EventBus>,
}

impl ProjectionManager {
    /// Create a manager over `event_bus`.
    #[must_use]
    pub fn new(event_bus: Arc<dyn EventBus>) -> Self {
        Self { event_bus }
    }

    /// Subscribe `projector` to every event of `event_type`.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`ironhorizon_core::event_bus::EventBusError`]
    /// the bus's `add_typed_handler` returned.
    pub fn subscribe_typed(
        &self,
        event_type: &'static str,
        projector: Arc<dyn EventHandler>,
    ) -> Result<(), ProjectionError> {
        self.event_bus
            .add_typed_handler(event_type, projector)
            .map_err(ProjectionError::from)
    }

    /// Subscribe `projector` to every event published on this bus,
    /// regardless of type.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`ironhorizon_core::event_bus::EventBusError`]
    /// the bus's `add_local_handler` returned.
    pub fn subscribe_all(&self, projector: Arc<dyn EventHandler>) -> Result<(), ProjectionError> {
        self.event_bus
            .add_local_handler(projector)
            .map_err(ProjectionError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironhorizon_core::event::EventRecord;
    use ironhorizon_core::event_bus::EventBusError;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBus {
        typed_calls: AtomicUsize,
        local_calls: AtomicUsize,
    }

    impl EventBus for FakeBus {
        fn publish_event(
            &self,
            _event: EventRecord,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }

        fn add_typed_handler(
            &self,
            _event_type: &'static str,
            _handler: Arc<dyn EventHandler>,
        ) -> Result<(), EventBusError> {
            self.typed_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn add_local_handler(&self, _handler: Arc<dyn EventHandler>) -> Result<(), EventBusError> {
            self.local_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn add_global_handler(&self, _handler: Arc<dyn EventHandler>) -> Result<(), EventBusError> {
            Ok(())
        }
    }

    struct NoopProjector;

    impl EventHandler for NoopProjector {
        fn handle_event(
            &self,
            _event: &EventRecord,
        ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[test]
    fn subscribe_typed_delegates_to_the_bus() {
        let bus = Arc::new(FakeBus {
            typed_calls: AtomicUsize::new(0),
            local_calls: AtomicUsize::new(0),
        });
        let manager = ProjectionManager::new(bus.clone());

        manager
            .subscribe_typed("OrderPlaced", Arc::new(NoopProjector))
            .expect("subscribe should succeed");

        assert_eq!(bus.typed_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribe_all_delegates_to_the_bus() {
        let bus = Arc::new(FakeBus {
            typed_calls: AtomicUsize::new(0),
            local_calls: AtomicUsize::new(0),
        });
        let manager = ProjectionManager::new(bus.clone());

        manager
            .subscribe_all(Arc::new(NoopProjector))
            .expect("subscribe should succeed");

        assert_eq!(bus.local_calls.load(Ordering::SeqCst), 1);
    }
}
