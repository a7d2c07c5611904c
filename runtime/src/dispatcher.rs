//! Command dispatcher: routes a command to its aggregate type, loads the
//! target aggregate, hands it the command, and saves the result.

use crate::error::RuntimeError;
use crate::repository::AggregateRepository;
use ironhorizon_core::command::Command;
use ironhorizon_core::event_store::EventStore;
use ironhorizon_core::identifier::Identifier;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Routes commands to aggregates and drives the load → handle → save
/// cycle.
///
/// `handle_command` follows five steps, each under its own debug span:
/// validate the command, resolve its aggregate type, load the target
/// aggregate, hand it the command, and save whatever events the handler
/// recorded.
pub struct CommandDispatcher<S: EventStore> {
    repository: Arc<AggregateRepository<S>>,
    routes: Mutex<HashMap<&'static str, &'static str>>,
}

impl<S: EventStore> CommandDispatcher<S> {
    /// Create a dispatcher over `repository`, with no command routes yet.
    #[must_use]
    pub fn new(repository: Arc<AggregateRepository<S>>) -> Self {
        Self {
            repository,
            routes: Mutex::new(HashMap::new()),
        }
    }

    /// Route `command_type` to `aggregate_type`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::CommandAlreadySet`] if `command_type` is
    /// already routed.
    pub fn set_aggregate(
        &self,
        aggregate_type: &'static str,
        command_type: &'static str,
    ) -> Result<(), RuntimeError> {
        let mut routes = self.routes.lock();
        if routes.contains_key(command_type) {
            return Err(RuntimeError::CommandAlreadySet(command_type.to_string()));
        }
        routes.insert(command_type, aggregate_type);
        Ok(())
    }

    /// Resolve, validate, load, handle, and save a command end to end.
    ///
    /// # Errors
    ///
    /// - [`RuntimeError::CommandNotRouted`] if no aggregate type is routed
    ///   for this command's type.
    /// - [`RuntimeError::Domain`] if `command.validate()` rejects the command.
    /// - Propagates whatever [`RuntimeError`] the repository's `load`/`save`
    ///   or the aggregate's `handle` produced.
    #[tracing::instrument(skip(self, command), fields(command_type = command.command_type(), aggregate_id = %command.aggregate_id()))]
    pub async fn handle_command(&self, command: Box<dyn Command>) -> Result<(), RuntimeError> {
        let aggregate_type = {
            let routes = self.routes.lock();
            *routes
                .get(command.command_type())
                .ok_or_else(|| RuntimeError::CommandNotRouted(command.command_type().to_string()))?
        };

        tracing::debug!("validating command");
        command.validate()?;

        tracing::debug!(aggregate_type, "loading aggregate");
        let id = Identifier::new(command.aggregate_id());
        let mut aggregate = self.repository.load(aggregate_type, id).await?;

        tracing::debug!("handling command");
        aggregate.handle(command.as_ref())?;

        tracing::debug!("saving aggregate");
        self.repository.save(aggregate.as_mut()).await?;

        Ok(())
    }
}
