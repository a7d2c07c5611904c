//! Domain-level errors raised by aggregates and command validation.

use thiserror::Error;

/// Errors produced while validating or handling a command against an aggregate.
///
/// This is distinct from the infrastructure errors in [`crate::event_store`],
/// [`crate::event_bus`] and [`crate::command_bus`]: `DomainError` is raised
/// by domain code itself (a command's `validate()`, or an aggregate's
/// `handle()`), not by the plumbing that moves commands and events around.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required command field was left at its zero value.
    ///
    /// Produced by the `#[derive(DomainCommand)]` macro's generated
    /// `validate()` for every field not annotated `#[ironhorizon(optional)]`.
    #[error("missing field: {field}")]
    MissingField {
        /// Name of the field that failed validation.
        field: &'static str,
    },

    /// The aggregate does not recognize this command, or the command targets
    /// a different aggregate type than the one that loaded it.
    #[error("command '{command_type}' is not valid for aggregate '{aggregate_type}'")]
    UnknownCommand {
        /// The command's type name.
        command_type: String,
        /// The aggregate's type name.
        aggregate_type: String,
    },

    /// A business rule rejected the command.
    #[error("business rule violated: {reason}")]
    BusinessRuleViolation {
        /// Human-readable explanation of which invariant was violated.
        reason: String,
    },

    /// The aggregate instance referenced by the command does not exist.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    /// A command could not be converted to or from its JSON wire payload.
    #[error("command serialization failed: {0}")]
    Serialization(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let err = DomainError::MissingField { field: "name" };
        assert_eq!(err.to_string(), "missing field: name");
    }

    #[test]
    fn business_rule_violation_display() {
        let err = DomainError::BusinessRuleViolation {
            reason: "guest list is full".to_string(),
        };
        assert!(err.to_string().contains("guest list is full"));
    }
}
