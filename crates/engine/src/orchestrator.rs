//! The local orchestrator (spec §4.7) — frontier-based, in-process
//! scheduler for a full blueprint run.
//!
//! One call to [`run`] drives a run start to finish: validate, seed the
//! frontier with start nodes, expand it turn by turn (every node in a
//! turn's snapshot runs concurrently through the resiliency pipeline),
//! computing successors per §4.7.1/§4.7.2 and testing join readiness per
//! §4.7 step 4(d), until the frontier empties or the run is cancelled.

use std::collections::{HashMap, HashSet};

use flowcraft_context::{Context, ExecutionMeta, SyncContextView};
use flowcraft_model::{Blueprint, BlueprintIndex, Edge, JoinStrategy, NodeResult};
use flowcraft_nodes::ImplementationRegistry;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::dag;
use crate::error::EngineError;
use crate::events::{Event, EventEmitter, EventKind};
use crate::executor::{ActivationInputs, NodeExecutor};
use crate::middleware::MiddlewareChain;
use crate::resiliency::run_activation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
    Stalled,
    Cancelled,
}

pub struct RunOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub context: Context,
    pub errors: Vec<EngineError>,
}

/// Everything one call to [`run`] needs. A struct rather than a long
/// argument list since callers (the CLI, the API, `subflow`) all build
/// this slightly differently.
pub struct RunRequest<'a> {
    pub blueprint: &'a Blueprint,
    pub registry: &'a ImplementationRegistry,
    pub middleware: &'a MiddlewareChain,
    pub emitter: &'a dyn EventEmitter,
    pub initial_state: HashMap<String, Value>,
    pub strict: bool,
    pub run_id: Uuid,
    pub cancellation: CancellationToken,
}

pub async fn run(req: RunRequest<'_>) -> Result<RunOutcome, EngineError> {
    let RunRequest {
        blueprint,
        registry,
        middleware,
        emitter,
        initial_state,
        strict,
        run_id,
        cancellation,
    } = req;

    let index = BlueprintIndex::build(blueprint, None)?;
    dag::validate_strict(&index, strict).map_err(EngineError::CyclicBlueprint)?;

    emitter.emit(Event::workflow(EventKind::WorkflowStart, run_id, blueprint.id.clone()));

    let mut meta = ExecutionMeta::new(run_id, blueprint.id.clone(), String::new());
    meta.cancellation = cancellation.clone();
    let ctx = SyncContextView::new(Context::with_initial(meta, initial_state));
    let node_executor = NodeExecutor::new(registry);

    let mut completed: HashSet<String> = HashSet::new();
    let mut scheduled: HashSet<String> = HashSet::new();
    let mut pending_input: HashMap<String, Value> = HashMap::new();
    let mut errors: Vec<EngineError> = Vec::new();
    // Edges pruned by action/condition selection (§4.7.1) — both the final
    // stall test and `All`-join readiness need to know which predecessors
    // were never going to arrive, as opposed to ones still pending.
    let mut excluded_edges: HashSet<(String, String)> = HashSet::new();

    let mut frontier: Vec<String> = index.start_nodes().into_iter().map(String::from).collect();
    for id in &frontier {
        scheduled.insert(id.clone());
    }

    while !frontier.is_empty() && !cancellation.is_cancelled() {
        let batch = std::mem::take(&mut frontier);

        let activations = futures::future::join_all(batch.iter().map(|node_id| {
            let node = index.node(node_id).expect("scheduled node id is in the index");
            let edge_input = pending_input.remove(node_id);
            let executor = &node_executor;
            let ctx_ref = &ctx;
            async move {
                let resolved_input = match executor.resolve_input(node, ctx_ref, edge_input).await {
                    Ok(v) => v,
                    Err(e) => return (node_id.clone(), Err(e)),
                };
                let inputs = ActivationInputs {
                    input: resolved_input,
                    params: node.params.clone(),
                    dependencies: None,
                };
                let result = run_activation(registry, middleware, emitter, node, ctx_ref, inputs, run_id, &blueprint.id).await;
                (node_id.clone(), result)
            }
        }))
        .await;

        let mut completed_this_turn: HashSet<String> = HashSet::new();
        let mut candidates: HashSet<String> = HashSet::new();

        for (node_id, outcome) in activations {
            match outcome {
                Ok(result) => {
                    completed.insert(node_id.clone());
                    completed_this_turn.insert(node_id.clone());

                    let snapshot = ctx.snapshot().to_json();
                    let successors = compute_successors(&index, &node_id, &result, &snapshot, &mut errors);

                    for (target, input) in successors.delivered {
                        pending_input.insert(target.clone(), input);
                        candidates.insert(target);
                    }

                    for target in successors.excluded_targets {
                        excluded_edges.insert((node_id.clone(), target.clone()));
                        // A join that already holds input from another
                        // predecessor may have become ready now that this
                        // edge is known to never arrive.
                        if pending_input.contains_key(&target) && !completed.contains(&target) {
                            candidates.insert(target);
                        }
                    }
                }
                Err(err) => errors.push(err),
            }
        }

        for candidate in candidates {
            if completed.contains(&candidate) {
                continue;
            }

            let Some(node) = index.node(&candidate) else { continue };
            let incoming = index.incoming(&candidate);
            let ready = match node.config().join_strategy {
                // Only wait on predecessors reached via edges that weren't
                // pruned by action/condition selection (§4.7 step 4(d)) —
                // an excluded edge's source is never going to arrive.
                JoinStrategy::All => incoming
                    .iter()
                    .filter(|e| !excluded_edges.contains(&(e.from.clone(), e.to.clone())))
                    .all(|e| completed.contains(e.from.as_str())),
                JoinStrategy::Any => {
                    !scheduled.contains(&candidate) && incoming.iter().any(|e| completed_this_turn.contains(e.from.as_str()))
                }
            };

            if ready && !scheduled.contains(&candidate) {
                scheduled.insert(candidate.clone());
                frontier.push(candidate);
            }
        }
    }

    // A node is excluded (§4.7 step 5) when it's unreachable from the start
    // nodes without crossing a pruned edge — it was never "entered" and was
    // never going to be. Only non-excluded nodes count toward completion.
    let mut live_nodes: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = index.start_nodes().into_iter().map(String::from).collect();
    while let Some(id) = stack.pop() {
        if !live_nodes.insert(id.clone()) {
            continue;
        }
        for edge in index.outgoing(&id) {
            if !excluded_edges.contains(&(edge.from.clone(), edge.to.clone())) {
                stack.push(edge.to.clone());
            }
        }
    }

    let cancelled = cancellation.is_cancelled();
    let status = if cancelled {
        RunStatus::Cancelled
    } else if !errors.is_empty() {
        RunStatus::Failed
    } else if completed.len() < live_nodes.len() {
        RunStatus::Stalled
    } else {
        RunStatus::Completed
    };

    match status {
        RunStatus::Completed => emitter.emit(Event::workflow(EventKind::WorkflowFinish, run_id, blueprint.id.clone())),
        RunStatus::Failed => emitter.emit(Event::workflow(EventKind::WorkflowFinish, run_id, blueprint.id.clone())),
        RunStatus::Stalled => emitter.emit(Event::workflow(EventKind::WorkflowStall, run_id, blueprint.id.clone())),
        RunStatus::Cancelled => emitter.emit(Event::workflow(EventKind::WorkflowCancelled, run_id, blueprint.id.clone())),
    }

    Ok(RunOutcome {
        run_id,
        status,
        context: ctx.snapshot(),
        errors,
    })
}

/// Result of [`compute_successors`] for one settled activation: the
/// targets newly carrying input, and the targets whose edge from this node
/// was pruned by action/condition selection rather than taken.
#[derive(Debug, Default)]
pub struct SuccessorOutcome {
    pub delivered: Vec<(String, Value)>,
    pub excluded_targets: Vec<String>,
}

/// §4.7.1 successor selection + §4.7.2 transform application, for one
/// settled activation.
///
/// Takes a context snapshot rather than a context reference so the
/// distributed adapter (`flowcraft-distributed`) can reuse this exact
/// logic against a remote `AsyncContext` without the local orchestrator's
/// synchronous `SyncContextView` in its call signature.
pub fn compute_successors(
    index: &BlueprintIndex<'_>,
    node_id: &str,
    result: &NodeResult,
    context_snapshot: &Value,
    errors: &mut Vec<EngineError>,
) -> SuccessorOutcome {
    let outgoing = index.outgoing(node_id);

    let has_action_match = outgoing
        .iter()
        .any(|e| result.action.as_deref().is_some_and(|a| e.action.as_deref() == Some(a)));

    let output = result.output.clone().unwrap_or(Value::Null);
    let transform_bindings = HashMap::from([
        ("input".to_string(), output.clone()),
        ("context".to_string(), context_snapshot.clone()),
    ]);
    // §4.3: a condition sees `result` (the source's output) and the
    // context's top-level keys as bare names — not the `input`/`context`
    // shape a transform sees.
    let mut condition_bindings = HashMap::from([("result".to_string(), output.clone())]);
    if let Value::Object(top_level) = context_snapshot {
        for (key, value) in top_level {
            condition_bindings.insert(key.clone(), value.clone());
        }
    }

    let mut delivered = Vec::with_capacity(outgoing.len());
    let mut excluded_targets = Vec::new();

    for edge in outgoing {
        let action_selected = if has_action_match {
            result.action.as_deref().is_some_and(|a| edge.action.as_deref() == Some(a))
        } else {
            edge.action.is_none()
        };

        if !action_selected {
            excluded_targets.push(edge.to.clone());
            continue;
        }

        if let Some(condition) = &edge.condition {
            if !flowcraft_expr::evaluate_condition(condition, &condition_bindings) {
                excluded_targets.push(edge.to.clone());
                continue;
            }
        }

        let target_input = match &edge.transform {
            None => output.clone(),
            Some(transform) => match flowcraft_expr::evaluate_transform(transform, &transform_bindings) {
                Ok(v) => v,
                Err(e) => {
                    errors.push(EngineError::TransformFailed { target: edge.to.clone(), message: e.to_string() });
                    continue;
                }
            },
        };

        delivered.push((edge.to.clone(), target_input));
    }

    SuccessorOutcome { delivered, excluded_targets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcraft_model::{NodeDefinition, NodeInputs};
    use flowcraft_nodes::mock::MockNode;
    use flowcraft_nodes::Implementation;
    use serde_json::json;

    fn node(id: &str, uses: &str) -> NodeDefinition {
        NodeDefinition { id: id.into(), uses: uses.into(), params: None, inputs: None, config: None }
    }
    fn edge(from: &str, to: &str) -> Edge {
        Edge { from: from.into(), to: to.into(), action: None, condition: None, transform: None }
    }

    #[tokio::test]
    async fn linear_chain_runs_in_order_and_completes() {
        let bp = Blueprint::new(
            "linear",
            vec![node("a", "a_impl"), node("b", "b_impl")],
            vec![edge("a", "b")],
        );

        let mut registry = ImplementationRegistry::new();
        registry.insert("a_impl", Implementation::function(MockNode::returning_output("a", json!("from-a"))));
        registry.insert("b_impl", Implementation::function(MockNode::returning_output("b", json!("from-b"))));

        let outcome = run(RunRequest {
            blueprint: &bp,
            registry: &registry,
            middleware: &MiddlewareChain::default(),
            emitter: &crate::events::NullEmitter,
            initial_state: HashMap::new(),
            strict: true,
            run_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
        })
        .await
        .unwrap();

        assert!(matches!(outcome.status, RunStatus::Completed));
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn missing_implementation_fails_run_without_panicking() {
        let bp = Blueprint::new("bp", vec![node("a", "ghost")], vec![]);
        let registry = ImplementationRegistry::new();

        let outcome = run(RunRequest {
            blueprint: &bp,
            registry: &registry,
            middleware: &MiddlewareChain::default(),
            emitter: &crate::events::NullEmitter,
            initial_state: HashMap::new(),
            strict: false,
            run_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
        })
        .await
        .unwrap();

        assert!(matches!(outcome.status, RunStatus::Failed));
        assert_eq!(outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn fan_out_fan_in_all_runs_join_once() {
        let mut nodes = vec![node("a", "seed"), node("b", "append_b"), node("c", "append_c"), node("d", "append_d")];
        nodes[3].config = Some(flowcraft_model::NodeConfig { join_strategy: JoinStrategy::All, ..Default::default() });
        nodes[3].inputs = Some(NodeInputs::Key("seen".to_string()));

        let bp = Blueprint::new(
            "diamond",
            nodes,
            vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")],
        );

        let mut registry = ImplementationRegistry::new();
        registry.insert("seed", Implementation::function(MockNode::returning_output("a", json!([]))));
        registry.insert("append_b", Implementation::function(AppendNode { tag: "B" }));
        registry.insert("append_c", Implementation::function(AppendNode { tag: "C" }));
        registry.insert("append_d", Implementation::function(AppendNode { tag: "D" }));

        let outcome = run(RunRequest {
            blueprint: &bp,
            registry: &registry,
            middleware: &MiddlewareChain::default(),
            emitter: &crate::events::NullEmitter,
            initial_state: HashMap::from([("seen".to_string(), json!([]))]),
            strict: true,
            run_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
        })
        .await
        .unwrap();

        assert!(matches!(outcome.status, RunStatus::Completed));
    }

    #[tokio::test]
    async fn action_excluded_branch_completes_rather_than_stalls() {
        let nodes = vec![node("a", "action_impl"), node("b", "b_impl"), node("c", "c_impl")];
        let mut yes_edge = edge("a", "b");
        yes_edge.action = Some("yes".to_string());
        let mut no_edge = edge("a", "c");
        no_edge.action = Some("no".to_string());

        let bp = Blueprint::new("branch", nodes, vec![yes_edge, no_edge]);

        let mut registry = ImplementationRegistry::new();
        let action_result = NodeResult { output: Some(json!("from-a")), action: Some("yes".to_string()), error: None };
        registry.insert("action_impl", Implementation::function(MockNode::returning("a", action_result)));
        registry.insert("b_impl", Implementation::function(MockNode::returning_output("b", json!("from-b"))));
        registry.insert("c_impl", Implementation::function(MockNode::returning_output("c", json!("from-c"))));

        let outcome = run(RunRequest {
            blueprint: &bp,
            registry: &registry,
            middleware: &MiddlewareChain::default(),
            emitter: &crate::events::NullEmitter,
            initial_state: HashMap::new(),
            strict: true,
            run_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
        })
        .await
        .unwrap();

        assert!(matches!(outcome.status, RunStatus::Completed));
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn all_join_fires_when_one_predecessor_is_action_excluded() {
        let mut nodes = vec![node("a", "action_impl"), node("b", "b_impl"), node("c", "c_impl"), node("d", "d_impl")];
        nodes[3].config = Some(flowcraft_model::NodeConfig { join_strategy: JoinStrategy::All, ..Default::default() });

        let mut yes_edge = edge("a", "b");
        yes_edge.action = Some("yes".to_string());
        let mut no_edge = edge("a", "c");
        no_edge.action = Some("no".to_string());

        let bp = Blueprint::new(
            "branch_then_join",
            nodes,
            vec![yes_edge, no_edge, edge("b", "d"), edge("c", "d")],
        );

        let mut registry = ImplementationRegistry::new();
        let action_result = NodeResult { output: Some(json!("from-a")), action: Some("yes".to_string()), error: None };
        registry.insert("action_impl", Implementation::function(MockNode::returning("a", action_result)));
        registry.insert("b_impl", Implementation::function(MockNode::returning_output("b", json!("from-b"))));
        registry.insert("c_impl", Implementation::function(MockNode::returning_output("c", json!("from-c"))));
        registry.insert("d_impl", Implementation::function(MockNode::returning_output("d", json!("from-d"))));

        let outcome = run(RunRequest {
            blueprint: &bp,
            registry: &registry,
            middleware: &MiddlewareChain::default(),
            emitter: &crate::events::NullEmitter,
            initial_state: HashMap::new(),
            strict: true,
            run_id: Uuid::new_v4(),
            cancellation: CancellationToken::new(),
        })
        .await
        .unwrap();

        assert!(matches!(outcome.status, RunStatus::Completed));
        assert!(outcome.errors.is_empty());
    }

    struct AppendNode {
        tag: &'static str,
    }

    #[async_trait::async_trait]
    impl flowcraft_nodes::ExecutableNode for AppendNode {
        async fn execute(
            &self,
            args: flowcraft_nodes::NodeArgs<'_>,
        ) -> Result<NodeResult, flowcraft_nodes::NodeError> {
            let mut seen: Vec<Value> = args
                .context
                .get("seen")
                .await
                .map_err(|e| flowcraft_nodes::NodeError::Fatal(e.to_string()))?
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            seen.push(json!(self.tag));
            args.context
                .set("seen", json!(seen))
                .await
                .map_err(|e| flowcraft_nodes::NodeError::Fatal(e.to_string()))?;
            Ok(NodeResult::ok(json!(self.tag)))
        }
    }
}
