//! The asynchronous context contract — the same capability set as
//! [`crate::Context`], but every operation returns a future because the
//! backing store may be remote.
//!
//! Node implementations are written once against this trait; whether it is
//! backed by a remote store or by [`crate::view::SyncContextView`] over an
//! in-process [`crate::Context`] is a per-run choice made by the
//! orchestrator, never by the node.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::ContextError;
use crate::meta::ExecutionMeta;

#[async_trait]
pub trait AsyncContext: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, ContextError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), ContextError>;
    async fn has(&self, key: &str) -> Result<bool, ContextError>;
    async fn delete(&self, key: &str) -> Result<Option<Value>, ContextError>;
    async fn keys(&self) -> Result<Vec<String>, ContextError>;
    async fn to_json(&self) -> Result<Value, ContextError>;

    /// A fresh scope seeded with the current snapshot plus an overlay,
    /// returned as a value the caller owns — a scope is always realised as
    /// an in-process [`crate::Context`] regardless of what backs `self`,
    /// because a sub-workflow's inner run is bounded and short-lived.
    async fn create_scope(
        &self,
        overlay: HashMap<String, Value>,
        meta: ExecutionMeta,
    ) -> Result<crate::Context, ContextError>;

    /// Owned copy of the run's metadata — owned rather than borrowed
    /// because a remote-store-backed implementation has nothing to borrow
    /// from.
    fn meta(&self) -> ExecutionMeta;
}
