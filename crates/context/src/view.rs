//! Adapts an in-process [`Context`] to the [`AsyncContext`] shape so node
//! code written against `AsyncContext` runs unmodified whether the run is
//! local or distributed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::async_context::AsyncContext;
use crate::error::ContextError;
use crate::meta::ExecutionMeta;
use crate::sync_context::Context;

/// Thin synchronous-over-asynchronous wrapper. All operations resolve
/// immediately; the `Mutex` only guards concurrent sibling activations
/// within the same local run.
#[derive(Clone)]
pub struct SyncContextView {
    inner: Arc<Mutex<Context>>,
}

impl SyncContextView {
    pub fn new(context: Context) -> Self {
        Self {
            inner: Arc::new(Mutex::new(context)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Context> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Escape hatch for the local orchestrator, which needs direct,
    /// non-async access to mutate context between frontier turns.
    pub fn with_inner<R>(&self, f: impl FnOnce(&mut Context) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> Context {
        self.lock().clone()
    }
}

#[async_trait]
impl AsyncContext for SyncContextView {
    async fn get(&self, key: &str) -> Result<Option<Value>, ContextError> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), ContextError> {
        self.lock().set(key.to_string(), value);
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool, ContextError> {
        Ok(self.lock().has(key))
    }

    async fn delete(&self, key: &str) -> Result<Option<Value>, ContextError> {
        Ok(self.lock().delete(key))
    }

    async fn keys(&self) -> Result<Vec<String>, ContextError> {
        Ok(self.lock().keys())
    }

    async fn to_json(&self) -> Result<Value, ContextError> {
        Ok(self.lock().to_json())
    }

    async fn create_scope(
        &self,
        overlay: HashMap<String, Value>,
        meta: ExecutionMeta,
    ) -> Result<Context, ContextError> {
        let mut scope = self.lock().create_scope(overlay);
        *scope.meta_mut() = meta;
        Ok(scope)
    }

    fn meta(&self) -> ExecutionMeta {
        self.lock().meta().clone()
    }
}
