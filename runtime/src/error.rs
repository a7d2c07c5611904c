//! Composite error type for the aggregate repository and command dispatcher.

use ironhorizon_core::{CommandBusError, DomainError, EventBusError, EventStoreError};
use thiserror::Error;

/// Errors raised by [`crate::AggregateRepository`] and [`crate::CommandDispatcher`].
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    /// `register_aggregate` was called twice for the same aggregate type.
    #[error("aggregate type already registered: {0}")]
    AggregateAlreadySet(String),

    /// No factory is registered for the requested aggregate type.
    #[error("aggregate type not registered: {0}")]
    AggregateNotFound(String),

    /// `set_aggregate` was called twice for the same command type.
    #[error("command type already routed: {0}")]
    CommandAlreadySet(String),

    /// No aggregate type is routed for this command type.
    #[error("command type not routed: {0}")]
    CommandNotRouted(String),

    /// The dispatcher was constructed without a usable repository.
    #[error("repository not configured")]
    NilRepository,

    /// The command failed structural validation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The event store rejected an append or load.
    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    /// The event bus rejected a publish or handler registration.
    #[error(transparent)]
    EventBus(#[from] EventBusError),

    /// The command bus rejected a dispatch or handler registration.
    #[error(transparent)]
    CommandBus(#[from] CommandBusError),
}
