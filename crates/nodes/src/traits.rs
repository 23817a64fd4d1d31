//! The `Implementation` contract — the sum type every registered `uses` key
//! resolves to.
//!
//! The source language treats function-shaped and class-shaped
//! implementations interchangeably via a runtime type guard; in Rust that
//! becomes an actual sum type the executor pattern-matches on, per the
//! REDESIGN FLAGS in the spec.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use flowcraft_context::AsyncContext;
use flowcraft_model::NodeResult;
use serde_json::Value;

use crate::error::NodeError;

/// Opaque value injected into every node activation — the spec's
/// "dependencies" (an HTTP client, a secrets provider, anything the host
/// application wants every node to see without threading it through
/// params).
pub type Dependencies = Option<Arc<dyn Any + Send + Sync>>;

/// Everything a node implementation needs for one call.
pub struct NodeArgs<'a> {
    pub context: &'a dyn AsyncContext,
    pub input: Value,
    pub params: Option<Value>,
    pub dependencies: Dependencies,
}

/// A single callable implementation — the "function-shaped" form.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    async fn execute(&self, args: NodeArgs<'_>) -> Result<NodeResult, NodeError>;
}

/// The "structured"/lifecycle-shaped form: three phases plus an optional
/// instance-level fallback.
///
/// - `prep` runs once, is never retried.
/// - `exec` is the only retryable phase.
/// - `post` runs once (even after a fallback success), may read the final
///   result but does not itself produce one; context augmentation happens
///   by writing through `args.context`.
/// - `fallback` is tried once if every `exec` attempt fails, *before* the
///   resiliency pipeline's own outer fallback is considered.
#[async_trait]
pub trait LifecycleNode: Send + Sync {
    async fn prep(&self, _args: &NodeArgs<'_>) -> Result<Value, NodeError> {
        Ok(Value::Null)
    }

    async fn exec(&self, prepped: Value, args: &NodeArgs<'_>) -> Result<NodeResult, NodeError>;

    async fn post(&self, _result: &NodeResult, _args: &NodeArgs<'_>) -> Result<(), NodeError> {
        Ok(())
    }

    async fn fallback(
        &self,
        _args: &NodeArgs<'_>,
        _error: &NodeError,
    ) -> Option<Result<NodeResult, NodeError>> {
        None
    }
}

/// What a `uses` key resolves to.
#[derive(Clone)]
pub enum Implementation {
    Function(Arc<dyn ExecutableNode>),
    Structured(Arc<dyn LifecycleNode>),
}

impl Implementation {
    pub fn function(node: impl ExecutableNode + 'static) -> Self {
        Implementation::Function(Arc::new(node))
    }

    pub fn structured(node: impl LifecycleNode + 'static) -> Self {
        Implementation::Structured(Arc::new(node))
    }
}
