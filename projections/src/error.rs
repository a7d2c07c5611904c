//! Errors raised while wiring or running a projection.

use ironhorizon_core::event_bus::EventBusError;
use ironhorizon_core::read_model::ReadModelError;
use thiserror::Error;

/// Errors raised by [`crate::ProjectionManager`] and the read-model store
/// it writes through.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// The underlying read-model store failed.
    #[error(transparent)]
    ReadModel(#[from] ReadModelError),

    /// Subscribing the projector to the event bus failed.
    #[error(transparent)]
    EventBus(#[from] EventBusError),
}
