//! Command trait and related types.
//!
//! Commands are requests to change state: "place this order", "accept this
//! invitation". Unlike events, they may be rejected. A command is handled by
//! exactly one aggregate instance, which either accepts it (producing zero
//! or more events) or rejects it with a [`crate::error::DomainError`].

use crate::error::DomainError;
use std::fmt;

/// A request to change the state of an aggregate.
///
/// # Validation
///
/// `validate()` checks structural well-formedness only (required fields
/// present, formats sane) — it runs *before* the command reaches an
/// aggregate and has no access to aggregate state. Business rules that
/// depend on current state (`"cannot accept an invitation that was already
/// declined"`) belong in the aggregate's command handler, not here.
///
/// Implementations are almost always generated by `#[derive(DomainCommand)]`
/// rather than written by hand; see the `ironhorizon-macros` crate.
pub trait Command: Send + Sync + fmt::Debug + 'static {
    /// The identifier of the aggregate instance this command targets.
    fn aggregate_id(&self) -> String;

    /// The aggregate type this command targets, e.g. `"Order"`.
    fn aggregate_type(&self) -> &'static str;

    /// A stable type name used to route this command to its handler, e.g.
    /// `"PlaceOrder"`.
    fn command_type(&self) -> &'static str;

    /// Check structural validity independent of aggregate state.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] if a required field was left at
    /// its zero value.
    fn validate(&self) -> Result<(), DomainError>;

    /// Encode this command as JSON for transport over a broker-backed
    /// [`crate::command_bus::CommandBus`].
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Serialization`] if the command's fields
    /// cannot be represented as JSON.
    fn to_json(&self) -> Result<serde_json::Value, DomainError>;
}

/// A function that reconstructs a boxed [`Command`] from its JSON payload.
///
/// Mirrors [`crate::event::EventFactory`]: the broker-backed command bus
/// keeps a `command_type -> CommandFactory` registry so commands read off
/// the wire can be turned back into concrete `Box<dyn Command>` values.
pub type CommandFactory = fn(serde_json::Value) -> Result<Box<dyn Command>, DomainError>;
