//! The distributed adapter itself (spec §4.8) — the same orchestration
//! semantics as the local orchestrator, with the frontier made explicit as
//! jobs on a queue and state held in a remote context.
//!
//! Built directly on `flowcraft_engine`'s resiliency pipeline
//! (`run_activation`) and successor/transform logic (`compute_successors`)
//! rather than reimplementing either.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use flowcraft_context::AsyncContext;
use flowcraft_coordination::CoordinationStore;
use flowcraft_engine::{
    resiliency, ActivationInputs, BlueprintRegistry, EventEmitter, MiddlewareChain, NodeExecutor, NullEmitter,
};
use flowcraft_model::{Blueprint, BlueprintIndex, JoinStrategy};
use flowcraft_nodes::ImplementationRegistry;
use flowcraft_queue::{Job, QueueDriver};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DistributedError;
use crate::hooks::DistributedHooks;
use crate::status::{FinalResult, RunStatusRecord, StatusStore};

/// Context key a predecessor writes its (possibly transformed) output
/// under for a specific successor, so the next job — which only carries
/// `{run_id, blueprint_id, node_id}` on the wire — can recover its input
/// from the remote context rather than from the job payload.
fn edge_input_key(node_id: &str) -> String {
    format!("__edge_input__{node_id}")
}

/// Context key tracking which node ids have completed in this run — the
/// remote-context analogue of the local orchestrator's in-memory
/// `completed: HashSet<String>`, read back by [`DistributedAdapter::reconcile`].
const COMPLETED_KEY: &str = "__completed__";

pub struct DistributedAdapter {
    blueprints: Arc<RwLock<BlueprintRegistry>>,
    implementations: Arc<ImplementationRegistry>,
    middleware: Arc<MiddlewareChain>,
    emitter: Arc<dyn EventEmitter>,
    queue: Arc<dyn QueueDriver>,
    coordination: Arc<dyn CoordinationStore>,
    status: Arc<dyn StatusStore>,
    hooks: Arc<dyn DistributedHooks>,
    join_ttl: Duration,
}

impl DistributedAdapter {
    pub fn new(
        implementations: Arc<ImplementationRegistry>,
        queue: Arc<dyn QueueDriver>,
        coordination: Arc<dyn CoordinationStore>,
        status: Arc<dyn StatusStore>,
        hooks: Arc<dyn DistributedHooks>,
    ) -> Self {
        Self {
            blueprints: Arc::new(RwLock::new(BlueprintRegistry::new())),
            implementations,
            middleware: Arc::new(MiddlewareChain::default()),
            emitter: Arc::new(NullEmitter),
            queue,
            coordination,
            status,
            hooks,
            join_ttl: Duration::from_secs(24 * 60 * 60),
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

    pub fn with_join_ttl(mut self, ttl: Duration) -> Self {
        self.join_ttl = ttl;
        self
    }

    /// Submit-run entry (spec §6): register the blueprint, materialize
    /// initial context, enqueue one job per start node, mark the run
    /// `running`.
    pub async fn submit_run(
        &self,
        blueprint: Blueprint,
        initial_state: HashMap<String, Value>,
    ) -> Result<Uuid, DistributedError> {
        let run_id = Uuid::new_v4();
        let index = BlueprintIndex::build(&blueprint, None)?;
        let start_nodes: Vec<String> = index.start_nodes().into_iter().map(str::to_string).collect();

        let ctx = self.hooks.create_context(run_id, &blueprint.id).await?;
        for (key, value) in initial_state {
            ctx.set(&key, value).await?;
        }

        self.status.write(RunStatusRecord::running(run_id, blueprint.id.clone())).await?;

        self.blueprints
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(blueprint.clone());

        for node_id in start_nodes {
            self.queue.enqueue_job(Job::new(run_id, blueprint.id.clone(), node_id)).await?;
        }

        Ok(run_id)
    }

    /// Process one job (spec §4.8 worker loop) — run the node through the
    /// resiliency pipeline, determine and enqueue ready successors, and
    /// finalize the run if this was its last outstanding terminal node.
    pub async fn process_job(&self, job: Job) -> Result<(), DistributedError> {
        if let Some(record) = self.status.get(job.run_id).await? {
            if record.status != "running" {
                tracing::debug!(run_id = %job.run_id, status = %record.status, "dropping job for non-running run");
                return Ok(());
            }
        }

        let blueprint = {
            let blueprints = self.blueprints.read().unwrap_or_else(|p| p.into_inner());
            blueprints
                .get(&job.blueprint_id)
                .cloned()
                .ok_or_else(|| DistributedError::UnknownBlueprint(job.blueprint_id.clone()))?
        };
        let index = BlueprintIndex::build(&blueprint, None)?;
        let node = index
            .node(&job.node_id)
            .ok_or_else(|| DistributedError::UnknownNode(job.node_id.clone()))?;

        let ctx = self.hooks.create_context(job.run_id, &job.blueprint_id).await?;
        self.hooks.on_job_start(job.run_id, &job.blueprint_id, &job.node_id).await?;
        self.status.touch(job.run_id).await?;

        let executor = NodeExecutor::new(&self.implementations);
        let edge_input = ctx.get(&edge_input_key(&job.node_id)).await?;
        let resolved_input = executor.resolve_input(node, ctx.as_ref(), edge_input).await?;
        let inputs = ActivationInputs { input: resolved_input, params: node.params.clone(), dependencies: None };

        let activation = resiliency::run_activation(
            &self.implementations,
            &self.middleware,
            self.emitter.as_ref(),
            node,
            ctx.as_ref(),
            inputs,
            job.run_id,
            &job.blueprint_id,
        )
        .await;

        match activation {
            Ok(result) => {
                self.mark_completed(ctx.as_ref(), &job.node_id).await?;

                let snapshot = ctx.to_json().await?;
                let mut transform_errors = Vec::new();
                let successors = flowcraft_engine::compute_successors(&index, &job.node_id, &result, &snapshot, &mut transform_errors);
                for e in &transform_errors {
                    tracing::warn!(run_id = %job.run_id, error = %e, "edge transform failed; that edge does not progress");
                }

                for (target, value) in successors.delivered {
                    ctx.set(&edge_input_key(&target), value).await?;

                    let Some(target_node) = index.node(&target) else { continue };
                    let incoming_count = index.incoming(&target).len() as u64;
                    let join_key = format!("{}:{}:join", job.run_id, target);

                    let ready = match target_node.config().join_strategy {
                        JoinStrategy::All => self.coordination.increment(&join_key, self.join_ttl).await? >= incoming_count.max(1),
                        JoinStrategy::Any => self.coordination.set_if_not_exist(&join_key, "fired".to_string(), self.join_ttl).await?,
                    };

                    if ready {
                        self.queue.enqueue_job(Job::new(job.run_id, job.blueprint_id.clone(), target.clone())).await?;
                    }
                }

                // A pruned (action/condition-excluded) edge still needs to be
                // counted in an `All` join's arrival tally (§4.7 step 4(d)) —
                // otherwise the join waits forever on a predecessor that was
                // never going to run. `Any` joins don't need this: one real
                // arrival is already sufficient.
                for target in successors.excluded_targets {
                    let Some(target_node) = index.node(&target) else { continue };
                    if target_node.config().join_strategy != JoinStrategy::All {
                        continue;
                    }
                    let incoming_count = index.incoming(&target).len() as u64;
                    let join_key = format!("{}:{}:join", job.run_id, target);
                    if self.coordination.increment(&join_key, self.join_ttl).await? >= incoming_count.max(1) {
                        self.queue.enqueue_job(Job::new(job.run_id, job.blueprint_id.clone(), target.clone())).await?;
                    }
                }

                if index.outgoing(&job.node_id).is_empty() {
                    self.maybe_finalize(job.run_id, &index, ctx.as_ref()).await?;
                }

                Ok(())
            }
            Err(err) => {
                let payload = ctx.to_json().await.unwrap_or(Value::Null);
                self.finalize(job.run_id, "failed", payload, Some(err.to_string())).await?;
                Err(DistributedError::from(err))
            }
        }
    }

    async fn mark_completed(&self, ctx: &dyn AsyncContext, node_id: &str) -> Result<(), DistributedError> {
        let mut completed: Vec<String> = ctx
            .get(COMPLETED_KEY)
            .await?
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        completed.push(node_id.to_string());
        ctx.set(COMPLETED_KEY, serde_json::json!(completed)).await?;
        Ok(())
    }

    /// Finalizes once every terminal node in the blueprint has completed,
    /// tallied via a coordination counter so concurrent workers finishing
    /// distinct terminal branches only publish once.
    async fn maybe_finalize(&self, run_id: Uuid, index: &BlueprintIndex<'_>, ctx: &dyn AsyncContext) -> Result<(), DistributedError> {
        let total_terminals = index.terminal_nodes().len() as u64;
        let key = format!("{run_id}:terminals");
        let reached = self.coordination.increment(&key, self.join_ttl).await?;

        if reached >= total_terminals.max(1) {
            let payload = ctx.to_json().await?;
            self.finalize(run_id, "completed", payload, None).await?;
        }

        Ok(())
    }

    async fn finalize(&self, run_id: Uuid, status: &str, payload: Value, reason: Option<String>) -> Result<(), DistributedError> {
        let blueprint_id = self
            .status
            .get(run_id)
            .await?
            .map(|r| r.blueprint_id)
            .unwrap_or_default();

        self.status
            .write(RunStatusRecord {
                run_id,
                blueprint_id,
                status: status.to_string(),
                reason: reason.clone(),
                last_updated: Utc::now().timestamp(),
            })
            .await?;

        self.hooks
            .publish_final_result(
                run_id,
                FinalResult { status: status.to_string(), payload, reason, last_updated: Utc::now().timestamp() },
            )
            .await
    }

    /// Cooperative cancellation: mark the run `cancelled` so in-flight and
    /// queued jobs for it are dropped by [`DistributedAdapter::process_job`]'s
    /// status check, then publish the final result immediately.
    pub async fn cancel_run(&self, run_id: Uuid) -> Result<(), DistributedError> {
        let payload = match self.hooks.create_context(run_id, "").await {
            Ok(ctx) => ctx.to_json().await.unwrap_or(Value::Null),
            Err(_) => Value::Null,
        };
        self.finalize(run_id, "cancelled", payload, Some("run cancelled".to_string())).await
    }

    /// Reconciliation sweep (spec §4.8) — for every run marked `running`
    /// whose status record has gone stale, recompute the ready-but-
    /// unscheduled frontier from the persisted `completed` marker and
    /// re-enqueue. Idempotent: re-running it against a run with no newly
    /// ready nodes enqueues nothing.
    pub async fn reconcile(&self, threshold: Duration) -> Result<usize, DistributedError> {
        let mut requeued = 0;

        for record in self.status.stale_running(threshold).await? {
            let blueprint = {
                let blueprints = self.blueprints.read().unwrap_or_else(|p| p.into_inner());
                match blueprints.get(&record.blueprint_id).cloned() {
                    Some(bp) => bp,
                    None => continue,
                }
            };
            let index = match BlueprintIndex::build(&blueprint, None) {
                Ok(idx) => idx,
                Err(_) => continue,
            };

            let ctx = self.hooks.create_context(record.run_id, &record.blueprint_id).await?;
            let completed: Vec<String> = ctx
                .get(COMPLETED_KEY)
                .await?
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default();
            let completed_set: std::collections::HashSet<&str> = completed.iter().map(String::as_str).collect();

            for node_id in index.node_ids() {
                if completed_set.contains(node_id) {
                    continue;
                }
                let incoming = index.incoming(node_id);
                if incoming.is_empty() {
                    continue; // start nodes are enqueued once at submit time, not by reconciliation.
                }
                let ready = incoming.iter().all(|e| completed_set.contains(e.from.as_str()));
                if !ready {
                    continue;
                }

                // Gate the re-enqueue through the coordination store (P7):
                // two sweeps over the same stale run must not both queue this
                // node just because it's still ready-but-incomplete.
                let dedup_key = format!("{}:{}:reconciled", record.run_id, node_id);
                let first_to_requeue = self
                    .coordination
                    .set_if_not_exist(&dedup_key, "1".to_string(), self.join_ttl)
                    .await?;
                if first_to_requeue {
                    self.queue
                        .enqueue_job(Job::new(record.run_id, record.blueprint_id.clone(), node_id.to_string()))
                        .await?;
                    requeued += 1;
                }
            }

            self.status.touch(record.run_id).await?;
        }

        Ok(requeued)
    }

    /// Worker entry (spec §6): start consuming jobs, dispatching each
    /// through [`DistributedAdapter::process_job`].
    pub async fn start(self: Arc<Self>) -> Result<(), DistributedError> {
        let adapter = self.clone();
        let handler: flowcraft_queue::JobHandler = Arc::new(move |job| {
            let adapter = adapter.clone();
            Box::pin(async move {
                adapter.process_job(job).await.map_err(|e| flowcraft_queue::QueueError::Handler(e.to_string()))
            })
        });
        self.queue.process_jobs(handler).await?;
        Ok(())
    }

    pub async fn stop(&self) {
        self.queue.stop().await;
    }

    pub async fn status_of(&self, run_id: Uuid) -> Result<Option<RunStatusRecord>, DistributedError> {
        self.status.get(run_id).await
    }
}
