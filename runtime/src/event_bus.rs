//! In-process, three-tier [`EventBus`] implementation.

use ironhorizon_core::event::EventRecord;
use ironhorizon_core::event_bus::{register_unique, EventBus, EventBusError, EventHandler};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};

type GlobalTable = LazyLock<Mutex<Vec<Arc<dyn EventHandler>>>>;

/// Handlers registered via [`EventBus::add_global_handler`] are shared by
/// every [`InProcessEventBus`] instance in the process, matching the
/// "global" tier's documented scope.
static GLOBAL_HANDLERS: GlobalTable = LazyLock::new(|| Mutex::new(Vec::new()));

/// In-process event bus: typed and local handler tiers live on the
/// instance, the global tier is shared process-wide.
///
/// Delivery is at-most-once: if a handler panics, handlers registered after
/// it for the same event are never invoked, because nothing isolates one
/// handler's call frame from the next. This is the trade-off this bus
/// accepts for avoiding broker round-trips in tests and single-process
/// deployments; `ironhorizon-broker::AmqpEventBus` is the at-least-once
/// alternative.
pub struct InProcessEventBus {
    typed: Mutex<HashMap<&'static str, Vec<Arc<dyn EventHandler>>>>,
    local: Mutex<Vec<Arc<dyn EventHandler>>>,
}

impl InProcessEventBus {
    /// Create a bus with empty typed and local handler tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            typed: Mutex::new(HashMap::new()),
            local: Mutex::new(Vec::new()),
        }
    }
}

impl Default for InProcessEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InProcessEventBus {
    fn publish_event(
        &self,
        event: EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        Box::pin(async move {
            // Local handlers run first within one publish, per the
            // ordering guarantee: local, then typed, then global.
            let mut handlers: Vec<Arc<dyn EventHandler>> = self.local.lock().iter().cloned().collect();
            {
                let typed = self.typed.lock();
                if let Some(matching) = typed.get(event.event_type.as_str()) {
                    handlers.extend(matching.iter().cloned());
                }
            }
            handlers.extend(GLOBAL_HANDLERS.lock().iter().cloned());

            for handler in handlers {
                if let Err(error) = handler.handle_event(&event).await {
                    tracing::warn!(
                        event_type = %event.event_type,
                        %error,
                        "event handler returned an error"
                    );
                }
            }

            Ok(())
        })
    }

    fn add_typed_handler(
        &self,
        event_type: &'static str,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), EventBusError> {
        register_unique(self.typed.lock().entry(event_type).or_default(), handler);
        Ok(())
    }

    fn add_local_handler(&self, handler: Arc<dyn EventHandler>) -> Result<(), EventBusError> {
        register_unique(&mut self.local.lock(), handler);
        Ok(())
    }

    fn add_global_handler(&self, handler: Arc<dyn EventHandler>) -> Result<(), EventBusError> {
        register_unique(&mut GLOBAL_HANDLERS.lock(), handler);
        Ok(())
    }
}
