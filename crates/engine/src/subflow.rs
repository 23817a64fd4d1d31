//! The built-in `subflow` implementation (spec §4.7.3) — a node whose
//! `params` name a child blueprint plus input/output key mappings.
//!
//! Registered under a well-known `uses` key (conventionally `"subflow"`)
//! alongside the host application's other implementations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flowcraft_model::Blueprint;
use flowcraft_nodes::{ExecutableNode, ImplementationRegistry, NodeArgs, NodeError};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::events::{EventEmitter, NullEmitter};
use crate::middleware::MiddlewareChain;
use crate::orchestrator::{self, RunRequest, RunStatus};

/// Child blueprints addressable by id, looked up by `SubflowNode` at
/// dispatch time. Kept separate from [`ImplementationRegistry`] since
/// blueprints and implementations resolve through different namespaces.
#[derive(Clone, Default)]
pub struct BlueprintRegistry {
    blueprints: HashMap<String, Blueprint>,
}

impl BlueprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, blueprint: Blueprint) {
        self.blueprints.insert(blueprint.id.clone(), blueprint);
    }

    pub fn get(&self, id: &str) -> Option<&Blueprint> {
        self.blueprints.get(id)
    }
}

#[derive(Debug, Deserialize)]
struct SubflowParams {
    blueprint_id: String,
    #[serde(default)]
    input_mapping: HashMap<String, String>,
    #[serde(default)]
    output_mapping: HashMap<String, String>,
}

/// Runs a nested blueprint as a single node activation, scoping its
/// context per spec §3 invariant 7 / §8 P4: the child sees only the keys
/// named by `input_mapping`, and only the keys named by `output_mapping`
/// are written back to the parent.
pub struct SubflowNode {
    blueprints: Arc<BlueprintRegistry>,
    implementations: Arc<ImplementationRegistry>,
    middleware: Arc<MiddlewareChain>,
    emitter: Arc<dyn EventEmitter>,
}

impl SubflowNode {
    pub fn new(blueprints: Arc<BlueprintRegistry>, implementations: Arc<ImplementationRegistry>) -> Self {
        Self {
            blueprints,
            implementations,
            middleware: Arc::new(MiddlewareChain::default()),
            emitter: Arc::new(NullEmitter),
        }
    }

    pub fn with_middleware(mut self, middleware: MiddlewareChain) -> Self {
        self.middleware = Arc::new(middleware);
        self
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }
}

#[async_trait]
impl ExecutableNode for SubflowNode {
    async fn execute(&self, args: NodeArgs<'_>) -> Result<NodeResultAlias, NodeError> {
        let params: SubflowParams = serde_json::from_value(args.params.clone().unwrap_or(Value::Null))
            .map_err(|e| NodeError::Fatal(format!("invalid subflow params: {e}")))?;

        let child_blueprint = self
            .blueprints
            .get(&params.blueprint_id)
            .ok_or_else(|| NodeError::Fatal(format!("unknown child blueprint '{}'", params.blueprint_id)))?;

        let parent_snapshot = args.context.to_json().await.map_err(|e| NodeError::Fatal(e.to_string()))?;
        let parent_obj = parent_snapshot.as_object().cloned().unwrap_or_default();

        let mut overlay = HashMap::with_capacity(params.input_mapping.len());
        for (child_key, parent_key) in &params.input_mapping {
            overlay.insert(child_key.clone(), parent_obj.get(parent_key).cloned().unwrap_or(Value::Null));
        }

        let parent_meta = args.context.meta();

        let outcome = orchestrator::run(RunRequest {
            blueprint: child_blueprint,
            registry: &self.implementations,
            middleware: &self.middleware,
            emitter: self.emitter.as_ref(),
            initial_state: overlay,
            strict: false,
            run_id: Uuid::new_v4(),
            cancellation: parent_meta.cancellation.clone(),
        })
        .await
        .map_err(|e| NodeError::Fatal(format!("subflow '{}' failed to start: {e}", params.blueprint_id)))?;

        match outcome.status {
            RunStatus::Completed => {
                let child_json = outcome.context.to_json();
                let child_obj = child_json.as_object().cloned().unwrap_or_default();

                let mut output = serde_json::Map::with_capacity(params.output_mapping.len());
                for (parent_key, child_key) in &params.output_mapping {
                    let value = child_obj.get(child_key).cloned().unwrap_or(Value::Null);
                    args.context
                        .set(parent_key, value.clone())
                        .await
                        .map_err(|e| NodeError::Fatal(e.to_string()))?;
                    output.insert(parent_key.clone(), value);
                }

                Ok(NodeResultAlias::ok(Value::Object(output)))
            }
            other => {
                let reason = outcome
                    .errors
                    .first()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| format!("child run ended in status {other:?}"));
                Err(NodeError::Fatal(format!("subflow '{}' did not complete: {reason}", params.blueprint_id)))
            }
        }
    }
}

// Local alias so this module doesn't need a second `flowcraft_model::NodeResult`
// import line next to the `Blueprint` one above.
type NodeResultAlias = flowcraft_model::NodeResult;

#[cfg(test)]
mod tests {
    use super::*;
    use flowcraft_context::{AsyncContext, Context, ExecutionMeta, SyncContextView};
    use flowcraft_model::NodeDefinition;
    use flowcraft_nodes::Implementation;
    use serde_json::json;

    fn node(id: &str, uses: &str) -> NodeDefinition {
        NodeDefinition { id: id.into(), uses: uses.into(), params: None, inputs: None, config: None }
    }

    #[tokio::test]
    async fn round_trips_mapped_keys_only() {
        let child = Blueprint::new(
            "child",
            vec![node("echo", "echo_impl")],
            vec![],
        );

        let mut child_registry = ImplementationRegistry::new();
        child_registry.insert("echo_impl", Implementation::function(EchoNode));

        let mut blueprints = BlueprintRegistry::new();
        blueprints.insert(child);

        let subflow = SubflowNode::new(Arc::new(blueprints), Arc::new(child_registry));

        let meta = ExecutionMeta::new(Uuid::new_v4(), "parent", "s");
        let parent_ctx = SyncContextView::new(Context::with_initial(
            meta,
            HashMap::from([("question".to_string(), json!("hi"))]),
        ));

        let params = json!({
            "blueprint_id": "child",
            "input_mapping": {"q": "question"},
            "output_mapping": {"answer": "final"},
        });

        let args = NodeArgs { context: &parent_ctx, input: Value::Null, params: Some(params), dependencies: None };
        let result = subflow.execute(args).await.unwrap();

        assert_eq!(result.output, Some(json!({"answer": "echo:hi"})));
        assert_eq!(parent_ctx.get("question").await.unwrap(), Some(json!("hi")));
        assert_eq!(parent_ctx.get("answer").await.unwrap(), Some(json!("echo:hi")));
        assert_eq!(parent_ctx.get("q").await.unwrap(), None, "child-internal key must not leak");
    }

    struct EchoNode;

    #[async_trait]
    impl ExecutableNode for EchoNode {
        async fn execute(&self, args: NodeArgs<'_>) -> Result<NodeResultAlias, NodeError> {
            let q = args
                .context
                .get("q")
                .await
                .map_err(|e| NodeError::Fatal(e.to_string()))?
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            args.context
                .set("final", json!(format!("echo:{q}")))
                .await
                .map_err(|e| NodeError::Fatal(e.to_string()))?;
            Ok(NodeResultAlias::ok(json!(format!("echo:{q}"))))
        }
    }
}
