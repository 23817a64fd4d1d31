//! `flowcraft-distributed` — the abstract distributed adapter (spec §4.8):
//! the same orchestration semantics as `flowcraft-engine`'s local
//! orchestrator, with the frontier made explicit as jobs on a queue and
//! state held in a remote context.

pub mod adapter;
pub mod error;
pub mod hooks;
pub mod status;

pub use adapter::DistributedAdapter;
pub use error::DistributedError;
pub use hooks::DistributedHooks;
pub use status::{FinalResult, InMemoryStatusStore, RunStatusRecord, StatusStore};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use flowcraft_context::{Context, ExecutionMeta, SyncContextView};
    use flowcraft_coordination::InMemoryCoordinationStore;
    use flowcraft_model::{Blueprint, Edge, NodeDefinition};
    use flowcraft_nodes::mock::MockNode;
    use flowcraft_nodes::Implementation;
    use flowcraft_queue::InMemoryQueue;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use uuid::Uuid;

    fn node(id: &str, uses: &str) -> NodeDefinition {
        NodeDefinition { id: id.into(), uses: uses.into(), params: None, inputs: None, config: None }
    }
    fn edge(from: &str, to: &str) -> Edge {
        Edge { from: from.into(), to: to.into(), action: None, condition: None, transform: None }
    }

    /// Every run shares a single in-process context keyed by run id — a
    /// stand-in for a remote context store in these tests.
    struct InMemoryHooks {
        contexts: StdMutex<HashMap<Uuid, SyncContextView>>,
        finals: StdMutex<Vec<FinalResult>>,
    }

    impl InMemoryHooks {
        fn new() -> Self {
            Self { contexts: StdMutex::new(HashMap::new()), finals: StdMutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl DistributedHooks for InMemoryHooks {
        async fn create_context(
            &self,
            run_id: Uuid,
            blueprint_id: &str,
        ) -> Result<std::sync::Arc<dyn flowcraft_context::AsyncContext>, DistributedError> {
            let mut contexts = self.contexts.lock().unwrap();
            let view = contexts
                .entry(run_id)
                .or_insert_with(|| SyncContextView::new(Context::new(ExecutionMeta::new(run_id, blueprint_id, ""))))
                .clone();
            Ok(std::sync::Arc::new(view))
        }

        async fn publish_final_result(&self, _run_id: Uuid, result: FinalResult) -> Result<(), DistributedError> {
            self.finals.lock().unwrap().push(result);
            Ok(())
        }
    }

    #[tokio::test]
    async fn linear_run_completes_and_publishes_once() {
        let bp = Blueprint::new("linear", vec![node("a", "a_impl"), node("b", "b_impl")], vec![edge("a", "b")]);

        let mut registry = flowcraft_nodes::ImplementationRegistry::new();
        registry.insert("a_impl", Implementation::function(MockNode::returning_output("a", json!("x"))));
        registry.insert("b_impl", Implementation::function(MockNode::returning_output("b", json!("y"))));

        let hooks = std::sync::Arc::new(InMemoryHooks::new());
        let adapter = std::sync::Arc::new(DistributedAdapter::new(
            std::sync::Arc::new(registry),
            std::sync::Arc::new(InMemoryQueue::new()),
            std::sync::Arc::new(InMemoryCoordinationStore::new()),
            std::sync::Arc::new(InMemoryStatusStore::new()),
            hooks.clone(),
        ));

        let run_id = adapter.submit_run(bp, HashMap::new()).await.unwrap();

        let worker = tokio::spawn(adapter.clone().start());

        let mut completed = None;
        for _ in 0..50 {
            if let Some(record) = adapter.status_of(run_id).await.unwrap() {
                if record.status != "running" {
                    completed = Some(record);
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        adapter.stop().await;
        let _ = tokio::time::timeout(Duration::from_millis(200), worker).await;

        let status = completed.expect("run did not finish within the test's polling window");
        assert_eq!(status.status, "completed");
        assert_eq!(hooks.finals.lock().unwrap().len(), 1);
    }
}
