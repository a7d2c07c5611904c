//! Read-model store contract: the query side of CQRS.
//!
//! Projections (`ironhorizon-projections`) subscribe to the event bus and
//! write denormalized views through a [`ReadModelStore`]. This crate only
//! defines the contract; concrete persistence (Postgres, Redis,
//! Elasticsearch) is a collaborator concern left to the application, per
//! the crate's non-goal on concrete database drivers. `ironhorizon-projections`
//! ships an in-memory implementation for tests and local development.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur while reading or writing a read model.
#[derive(Error, Debug, Clone)]
pub enum ReadModelError {
    /// No read model was registered under this key.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The model's storage slot was never configured for this read model
    /// name.
    #[error("model not set: {0}")]
    ModelNotSet(String),

    /// The underlying storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The stored payload could not be deserialized into the requested
    /// type.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Storage backend for projection read models, keyed by a caller-chosen
/// string key (typically the aggregate id or a composite query key).
///
/// # Dyn Compatibility
///
/// Uses `Pin<Box<dyn Future>>` returns so the projection manager can hold
/// its store behind `Arc<dyn ReadModelStore>`.
pub trait ReadModelStore: Send + Sync {
    /// Save a read model's JSON representation under `key`, overwriting
    /// any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`ReadModelError::Storage`] if the backend fails.
    fn save(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReadModelError>> + Send + '_>>;

    /// Find one read model by key.
    ///
    /// # Errors
    ///
    /// Returns [`ReadModelError::Storage`] if the backend fails. A missing
    /// key is not an error: it returns `Ok(None)`.
    fn find(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<serde_json::Value>, ReadModelError>> + Send + '_>>;

    /// Find every read model currently stored.
    ///
    /// # Errors
    ///
    /// Returns [`ReadModelError::Storage`] if the backend fails.
    fn find_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<serde_json::Value>, ReadModelError>> + Send + '_>>;

    /// Remove a read model by key.
    ///
    /// Removing a key that doesn't exist is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ReadModelError::Storage`] if the backend fails.
    fn remove(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReadModelError>> + Send + '_>>;
}
