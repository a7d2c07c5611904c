//! In-process, single-handler [`CommandBus`] implementation.

use ironhorizon_core::command::Command;
use ironhorizon_core::command_bus::{CommandBus, CommandBusError, CommandHandler};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// In-process command bus: `handle_command` and `publish_command` are
/// synonyms here, both routing directly to the registered handler. The
/// broker-backed `ironhorizon-broker::AmqpCommandBus` is where the two
/// diverge (publish is fire-and-forget; handle is the consumer's local
/// entry point).
pub struct InProcessCommandBus {
    handlers: Mutex<HashMap<&'static str, Arc<dyn CommandHandler>>>,
}

impl InProcessCommandBus {
    /// Create a bus with no handlers registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InProcessCommandBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBus for InProcessCommandBus {
    fn set_handler(
        &self,
        command_type: &'static str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), CommandBusError> {
        let mut handlers = self.handlers.lock();
        if handlers.contains_key(command_type) {
            return Err(CommandBusError::HandlerAlreadySet(command_type.to_string()));
        }
        handlers.insert(command_type, handler);
        Ok(())
    }

    fn handle_command(
        &self,
        command: Box<dyn Command>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>> {
        Box::pin(async move {
            let handler = {
                let handlers = self.handlers.lock();
                handlers
                    .get(command.command_type())
                    .ok_or_else(|| {
                        CommandBusError::HandlerNotFound(command.command_type().to_string())
                    })?
                    .clone()
            };
            handler.handle_command(command.as_ref()).await
        })
    }

    fn publish_command(
        &self,
        command: Box<dyn Command>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>> {
        self.handle_command(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Noop;

    impl Command for Noop {
        fn aggregate_id(&self) -> String {
            "noop-1".to_string()
        }
        fn aggregate_type(&self) -> &'static str {
            "Noop"
        }
        fn command_type(&self) -> &'static str {
            "Noop"
        }
        fn validate(&self) -> Result<(), ironhorizon_core::error::DomainError> {
            Ok(())
        }
        fn to_json(&self) -> Result<serde_json::Value, ironhorizon_core::error::DomainError> {
            Ok(serde_json::json!({}))
        }
    }

    struct AcceptingHandler;

    impl CommandHandler for AcceptingHandler {
        fn handle_command(
            &self,
            _command: &dyn Command,
        ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn routes_to_registered_handler() {
        let bus = InProcessCommandBus::new();
        bus.set_handler("Noop", Arc::new(AcceptingHandler))
            .expect("registration should succeed");

        let result = bus.handle_command(Box::new(Noop)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unrouted_command_is_rejected() {
        let bus = InProcessCommandBus::new();
        let result = bus.handle_command(Box::new(Noop)).await;
        assert!(matches!(result, Err(CommandBusError::HandlerNotFound(_))));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let bus = InProcessCommandBus::new();
        bus.set_handler("Noop", Arc::new(AcceptingHandler))
            .expect("first registration should succeed");
        let result = bus.set_handler("Noop", Arc::new(AcceptingHandler));
        assert!(matches!(result, Err(CommandBusError::HandlerAlreadySet(_))));
    }
}
