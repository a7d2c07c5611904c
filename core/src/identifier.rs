//! Aggregate and stream identifiers.
//!
//! An [`Identifier`] names a single aggregate instance. It doubles as the
//! event store's stream key, the event bus's routing key component, and the
//! read model's lookup key, so every component in the runtime agrees on one
//! identifier type instead of each inventing its own string newtype.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Error returned when parsing an [`Identifier`] from an untrusted string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid identifier: {0}")]
pub struct ParseIdentifierError(String);

/// Unique identifier for an aggregate instance.
///
/// `Identifier` wraps a `String` rather than a `Uuid` directly: namespaced
/// identifiers such as `"order-12345"` or `"invitation-acme-42"` are common
/// in this runtime (see the namespace-prefix guidance in the command bus and
/// event bus naming helpers), and forcing every caller through UUID parsing
/// would make those conventions awkward to express.
///
/// # Examples
///
/// ```
/// use ironhorizon_core::identifier::Identifier;
///
/// let id = Identifier::new("order-12345");
/// assert_eq!(id.as_str(), "order-12345");
///
/// let generated = Identifier::generate();
/// assert!(!generated.as_str().is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Create an identifier from trusted, application-controlled input.
    ///
    /// No validation is performed. Use [`FromStr`] when parsing values that
    /// originate outside the process.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier from a random UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier, returning the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identifier {
    type Err = ParseIdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ParseIdentifierError(
                "identifier cannot be empty".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
