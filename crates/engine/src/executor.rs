//! The node executor (spec §4.6) — resolves a node's implementation and
//! dispatches to it, resolving inputs first.

use flowcraft_context::AsyncContext;
use flowcraft_model::{NodeDefinition, NodeInputs, NodeResult};
use flowcraft_nodes::{Dependencies, ExecutableNode, Implementation, ImplementationRegistry, NodeArgs, NodeError};
use serde_json::Value;

use crate::error::EngineError;

/// Resolves `uses` strings against the registry and runs the resulting
/// implementation exactly once. Retry/timeout/fallback looping is the
/// resiliency pipeline's job, not this module's.
pub struct NodeExecutor<'a> {
    registry: &'a ImplementationRegistry,
}

impl<'a> NodeExecutor<'a> {
    pub fn new(registry: &'a ImplementationRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, uses: &str) -> Result<&'a Implementation, EngineError> {
        self.registry
            .get(uses)
            .ok_or_else(|| EngineError::ImplementationMissing(uses.to_string()))
    }

    /// Resolve a node's input: a missing `inputs` yields the edge's
    /// incoming payload (or `Null` for a start node); a string `inputs`
    /// reads one context key; a record `inputs` maps local names to
    /// context keys.
    pub async fn resolve_input(
        &self,
        node: &NodeDefinition,
        ctx: &dyn AsyncContext,
        edge_input: Option<Value>,
    ) -> Result<Value, EngineError> {
        match &node.inputs {
            None => Ok(edge_input.unwrap_or(Value::Null)),
            Some(NodeInputs::Key(key)) => Ok(ctx.get(key).await?.unwrap_or(Value::Null)),
            Some(NodeInputs::Mapping(mapping)) => {
                let mut obj = serde_json::Map::with_capacity(mapping.len());
                for (local_name, ctx_key) in mapping {
                    let value = ctx.get(ctx_key).await?.unwrap_or(Value::Null);
                    obj.insert(local_name.clone(), value);
                }
                Ok(Value::Object(obj))
            }
        }
    }
}

/// One concrete invocation's inputs, cheap to clone per retry attempt.
#[derive(Clone)]
pub struct ActivationInputs {
    pub input: Value,
    pub params: Option<Value>,
    pub dependencies: Dependencies,
}

impl ActivationInputs {
    fn args<'a>(&self, ctx: &'a dyn AsyncContext) -> NodeArgs<'a> {
        NodeArgs {
            context: ctx,
            input: self.input.clone(),
            params: self.params.clone(),
            dependencies: self.dependencies.clone(),
        }
    }
}

/// Run a `Function`-shaped implementation exactly once.
pub async fn invoke_function(
    node: &dyn ExecutableNode,
    ctx: &dyn AsyncContext,
    inputs: &ActivationInputs,
) -> Result<NodeResult, NodeError> {
    node.execute(inputs.args(ctx)).await
}

/// Run a `Structured`/lifecycle implementation's full `prep -> exec -> post`
/// sequence for ONE `exec` attempt (the resiliency pipeline calls `prep`
/// once up front and retries only the `exec` step).
pub mod lifecycle {
    use super::*;
    use flowcraft_nodes::LifecycleNode;

    pub async fn prep(
        node: &dyn LifecycleNode,
        ctx: &dyn AsyncContext,
        inputs: &ActivationInputs,
    ) -> Result<Value, NodeError> {
        node.prep(&inputs.args(ctx)).await
    }

    pub async fn exec(
        node: &dyn LifecycleNode,
        ctx: &dyn AsyncContext,
        inputs: &ActivationInputs,
        prepped: Value,
    ) -> Result<NodeResult, NodeError> {
        node.exec(prepped, &inputs.args(ctx)).await
    }

    pub async fn post(
        node: &dyn LifecycleNode,
        ctx: &dyn AsyncContext,
        inputs: &ActivationInputs,
        result: &NodeResult,
    ) -> Result<(), NodeError> {
        node.post(result, &inputs.args(ctx)).await
    }

    pub async fn instance_fallback(
        node: &dyn LifecycleNode,
        ctx: &dyn AsyncContext,
        inputs: &ActivationInputs,
        error: &NodeError,
    ) -> Option<Result<NodeResult, NodeError>> {
        node.fallback(&inputs.args(ctx), error).await
    }
}
