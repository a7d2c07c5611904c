//! Errors specific to the AMQP transport, and their mapping onto the core
//! bus error types.

use ironhorizon_core::{CommandBusError, EventBusError};
use thiserror::Error;

/// Errors raised by the AMQP connection and channel machinery, before they
/// are translated into the [`EventBusError`]/[`CommandBusError`] the
/// `EventBus`/`CommandBus` traits require.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Could not establish or re-establish the AMQP connection.
    #[error("amqp connection failed: {0}")]
    ConnectionFailed(String),

    /// Could not open a channel, declare an exchange/queue, or bind one.
    #[error("amqp channel error: {0}")]
    Channel(String),

    /// The bus was asked to publish or consume while not in the `Running`
    /// state.
    #[error("bus is not running (current state: {0:?})")]
    NotRunning(crate::state::BrokerState),

    /// `close()` was called on a bus that was already `Closed`.
    #[error("bus is already closed")]
    AlreadyClosed,
}

impl From<BrokerError> for EventBusError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::ConnectionFailed(reason) => EventBusError::ConnectionFailed(reason),
            other => EventBusError::TransportError(other.to_string()),
        }
    }
}

impl From<BrokerError> for CommandBusError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::ConnectionFailed(reason) => {
                CommandBusError::TransportError(format!("connection failed: {reason}"))
            }
            other => CommandBusError::TransportError(other.to_string()),
        }
    }
}
