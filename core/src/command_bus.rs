//! Command bus: single-handler routing for commands.
//!
//! Unlike the event bus's fan-out, exactly one handler may be registered
//! per `command_type`. Registering a second handler for a type that
//! already has one is a programming error, reported as
//! [`CommandBusError::HandlerAlreadySet`] rather than silently replacing
//! the first handler or running both.

use crate::command::Command;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during command bus operations.
#[derive(Error, Debug, Clone)]
pub enum CommandBusError {
    /// A handler is already registered for this command type.
    #[error("handler already set for '{0}'")]
    HandlerAlreadySet(String),

    /// No handler is registered for this command type.
    #[error("handler not found for '{0}'")]
    HandlerNotFound(String),

    /// Publishing a command to the broker transport failed.
    #[error("publish failed for command type '{command_type}': {reason}")]
    PublishFailed {
        /// The command type that failed to publish.
        command_type: String,
        /// The reason for failure.
        reason: String,
    },

    /// A transport-level error from the underlying broker client.
    #[error("transport error: {0}")]
    TransportError(String),
}

/// Handles one command type for a [`CommandBus`].
///
/// # Dyn Compatibility
///
/// Returns a boxed future so handlers can be stored as `Arc<dyn
/// CommandHandler>` in the bus's routing table.
pub trait CommandHandler: Send + Sync {
    /// Handle a command.
    ///
    /// # Errors
    ///
    /// Returns whatever [`crate::error::DomainError`] or infrastructure
    /// error the underlying dispatch produced; the command bus itself does
    /// not interpret the error, only propagates it to the caller.
    fn handle_command(
        &self,
        command: &dyn Command,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>>;
}

/// Single-handler command routing, in-process or broker-backed.
///
/// # Dyn Compatibility
///
/// Uses `Pin<Box<dyn Future>>` returns so implementations can be held as
/// `Arc<dyn CommandBus>`.
pub trait CommandBus: Send + Sync {
    /// Register the one handler for a command type.
    ///
    /// # Errors
    ///
    /// Returns [`CommandBusError::HandlerAlreadySet`] if a handler is
    /// already registered for `command_type`.
    fn set_handler(
        &self,
        command_type: &'static str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), CommandBusError>;

    /// Dispatch a command to its registered handler.
    ///
    /// `handle_command` and `publish_command` are synonyms on the
    /// in-process bus: both route directly to the local handler table.
    /// They diverge on the broker-backed bus, where `publish_command` is
    /// fire-and-forget (publish to the queue and return) while
    /// `handle_command` is the entry point the consumer loop itself calls
    /// once a message is delivered.
    ///
    /// # Errors
    ///
    /// Returns [`CommandBusError::HandlerNotFound`] if no handler is
    /// registered for the command's type, or propagates whatever error the
    /// handler itself returned.
    fn handle_command(
        &self,
        command: Box<dyn Command>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>>;

    /// Publish a command for asynchronous handling.
    ///
    /// # Errors
    ///
    /// See [`CommandBus::handle_command`].
    fn publish_command(
        &self,
        command: Box<dyn Command>,
    ) -> Pin<Box<dyn Future<Output = Result<(), CommandBusError>> + Send + '_>>;
}

/// Build the exchange name for an application's commands, mirroring
/// [`crate::event_bus::events_exchange_name`].
#[must_use]
pub fn commands_exchange_name(app_namespace: &str) -> String {
    format!("{app_namespace}.commands.exchange")
}

/// Build the durable queue name for a tagged command handler, mirroring
/// [`crate::event_bus::events_queue_name`].
#[must_use]
pub fn commands_queue_name(app_namespace: &str, consumer_tag: &str) -> String {
    format!("{app_namespace}.{consumer_tag}.commands.queue")
}
