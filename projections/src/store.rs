//! `HashMap`-backed [`ReadModelStore`] for tests and local development.

use ironhorizon_core::read_model::{ReadModelError, ReadModelStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// An in-memory, process-local read-model store.
///
/// Concrete projections meant to survive a restart or be queried from
/// another process should implement [`ReadModelStore`] against Postgres,
/// Redis, or whatever storage the application already runs — this store
/// exists for tests and local development, not production persistence.
#[derive(Default)]
pub struct InMemoryReadModelStore {
    models: Mutex<HashMap<String, serde_json::Value>>,
}

impl InMemoryReadModelStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadModelStore for InMemoryReadModelStore {
    fn save(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReadModelError>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            self.models.lock().insert(key, value);
            Ok(())
        })
    }

    fn find(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<serde_json::Value>, ReadModelError>> + Send + '_>>
    {
        let key = key.to_string();
        Box::pin(async move { Ok(self.models.lock().get(&key).cloned()) })
    }

    fn find_all(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<serde_json::Value>, ReadModelError>> + Send + '_>>
    {
        Box::pin(async move { Ok(self.models.lock().values().cloned().collect()) })
    }

    fn remove(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), ReadModelError>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            self.models.lock().remove(&key);
            Ok(())
        })
    }
}
