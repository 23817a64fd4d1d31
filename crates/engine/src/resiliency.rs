//! The resiliency pipeline (spec §4.5) — retries, timeout, fallback, and
//! middleware wrapped around a single node activation.
//!
//! Composition, outside-in: middleware `around` chain → `before` hooks →
//! core attempt loop (retry/timeout/fallback) → `after` hooks (guaranteed,
//! even on failure).

use std::time::Duration;

use flowcraft_context::AsyncContext;
use flowcraft_model::{NodeConfig, NodeDefinition, NodeResult};
use flowcraft_nodes::{Implementation, ImplementationRegistry, LifecycleNode, NodeError};
use uuid::Uuid;

use crate::error::EngineError;
use crate::events::{Event, EventEmitter, EventKind};
use crate::executor::{self, lifecycle, ActivationInputs, NodeExecutor};
use crate::middleware::MiddlewareChain;

/// Outcome of a single attempt at the retryable core (one `execute` call or
/// one `exec` call), distinguishing timeout from an ordinary retryable
/// failure so the final error can name which one exhausted the budget.
enum AttemptError {
    Fatal(String),
    Retryable(String),
    Timeout(u64),
}

impl From<NodeError> for AttemptError {
    fn from(err: NodeError) -> Self {
        match err {
            NodeError::Fatal(m) => AttemptError::Fatal(m),
            NodeError::Retryable(m) => AttemptError::Retryable(m),
        }
    }
}

async fn timed<F>(fut: F, timeout: Option<Duration>) -> Result<NodeResult, AttemptError>
where
    F: std::future::Future<Output = Result<NodeResult, NodeError>>,
{
    match timeout {
        None => fut.await.map_err(AttemptError::from),
        Some(d) => match tokio::time::timeout(d, fut).await {
            Ok(inner) => inner.map_err(AttemptError::from),
            Err(_) => Err(AttemptError::Timeout(d.as_millis() as u64)),
        },
    }
}

/// Run one node activation end to end: resolve the implementation, run the
/// attempt loop (+ fallback), and emit the node's lifecycle events.
pub async fn run_activation(
    registry: &ImplementationRegistry,
    middleware: &MiddlewareChain,
    emitter: &dyn EventEmitter,
    node: &NodeDefinition,
    ctx: &dyn AsyncContext,
    inputs: ActivationInputs,
    run_id: Uuid,
    blueprint_id: &str,
) -> Result<NodeResult, EngineError> {
    let node_id = node.id.clone();
    emitter.emit(Event::node(EventKind::NodeStart, run_id, blueprint_id, node_id.clone()));

    let executor = NodeExecutor::new(registry);
    let implementation = match executor.resolve(&node.uses) {
        Ok(i) => i.clone(),
        Err(e) => {
            emitter.emit(
                Event::node(EventKind::NodeError, run_id, blueprint_id, node_id.clone())
                    .with_error(e.to_string()),
            );
            return Err(e);
        }
    };

    let config = node.config();

    let node_id_for_core = node_id.clone();
    let blueprint_id_owned = blueprint_id.to_string();
    let core: Box<dyn FnOnce() -> futures::future::BoxFuture<'_, Result<NodeResult, EngineError>> + Send + '_> =
        Box::new(move || {
            Box::pin(async move {
                middleware.run_before(ctx, &node_id_for_core).await?;
                let outcome = run_core(
                    registry,
                    &implementation,
                    ctx,
                    &inputs,
                    &config,
                    emitter,
                    run_id,
                    &blueprint_id_owned,
                    &node_id_for_core,
                )
                .await;
                middleware
                    .run_after(ctx, &node_id_for_core, outcome.as_ref().ok(), outcome.as_ref().err())
                    .await;
                outcome
            })
        });

    let result = middleware.run_around(ctx, &node_id, core).await;

    match &result {
        Ok(_) => emitter.emit(Event::node(EventKind::NodeFinish, run_id, blueprint_id, node_id.clone())),
        Err(e) => emitter.emit(
            Event::node(EventKind::NodeError, run_id, blueprint_id, node_id).with_error(e.to_string()),
        ),
    }

    result
}

/// The attempt loop + node-level fallback + pipeline-level fallback,
/// without middleware or the start/finish/error events (those wrap this).
#[allow(clippy::too_many_arguments)]
async fn run_core(
    registry: &ImplementationRegistry,
    implementation: &Implementation,
    ctx: &dyn AsyncContext,
    inputs: &ActivationInputs,
    config: &NodeConfig,
    emitter: &dyn EventEmitter,
    run_id: Uuid,
    blueprint_id: &str,
    node_id: &str,
) -> Result<NodeResult, EngineError> {
    let max_retries = config.effective_max_retries();
    let retry_delay = config.retry_delay_ms.map(Duration::from_millis);
    let timeout = config.timeout_ms.map(Duration::from_millis);
    let cancellation = ctx.meta().cancellation;

    let core_outcome: Result<NodeResult, AttemptError> = match implementation {
        Implementation::Function(f) => {
            retry_loop(
                || timed(executor::invoke_function(f.as_ref(), ctx, inputs), timeout),
                max_retries,
                retry_delay,
                &cancellation,
                emitter,
                run_id,
                blueprint_id,
                node_id,
            )
            .await
        }
        Implementation::Structured(node_impl) => {
            run_structured(node_impl.as_ref(), ctx, inputs, max_retries, retry_delay, timeout, &cancellation, emitter, run_id, blueprint_id, node_id).await
        }
    };

    match core_outcome {
        Ok(result) => Ok(result),
        Err(AttemptError::Fatal(msg)) => Err(EngineError::FatalError { node_id: node_id.to_string(), message: msg }),
        Err(core_err) => {
            // Retries (and any instance-level fallback) are exhausted.
            // Try the pipeline-level fallback, if configured.
            if let Some(fallback_uses) = &config.fallback {
                match registry.get(fallback_uses) {
                    Some(fallback_impl) => {
                        emitter.emit(Event::node(EventKind::NodeFallback, run_id, blueprint_id, node_id));
                        run_pipeline_fallback(fallback_impl, ctx, inputs)
                            .await
                            .map_err(|e| attempt_error_to_engine_error(e, node_id))
                    }
                    None => Err(EngineError::ImplementationMissing(fallback_uses.clone())),
                }
            } else {
                Err(attempt_error_to_engine_error(core_err, node_id))
            }
        }
    }
}

async fn run_structured(
    node_impl: &dyn LifecycleNode,
    ctx: &dyn AsyncContext,
    inputs: &ActivationInputs,
    max_retries: u32,
    retry_delay: Option<Duration>,
    timeout: Option<Duration>,
    cancellation: &tokio_util::sync::CancellationToken,
    emitter: &dyn EventEmitter,
    run_id: Uuid,
    blueprint_id: &str,
    node_id: &str,
) -> Result<NodeResult, AttemptError> {
    let prepped = lifecycle::prep(node_impl, ctx, inputs).await.map_err(AttemptError::from)?;

    let exec_outcome = retry_loop(
        || timed(lifecycle::exec(node_impl, ctx, inputs, prepped.clone()), timeout),
        max_retries,
        retry_delay,
        cancellation,
        emitter,
        run_id,
        blueprint_id,
        node_id,
    )
    .await;

    match exec_outcome {
        Ok(result) => {
            let _ = lifecycle::post(node_impl, ctx, inputs, &result).await;
            Ok(result)
        }
        Err(AttemptError::Fatal(msg)) => Err(AttemptError::Fatal(msg)),
        Err(exec_err) => {
            let as_node_error = match &exec_err {
                AttemptError::Retryable(m) => NodeError::Retryable(m.clone()),
                AttemptError::Timeout(ms) => NodeError::Retryable(format!("timed out after {ms}ms")),
                AttemptError::Fatal(_) => unreachable!("handled above"),
            };

            match lifecycle::instance_fallback(node_impl, ctx, inputs, &as_node_error).await {
                Some(Ok(result)) => {
                    emitter.emit(Event::node(EventKind::NodeFallback, run_id, blueprint_id, node_id));
                    let _ = lifecycle::post(node_impl, ctx, inputs, &result).await;
                    Ok(result)
                }
                Some(Err(NodeError::Fatal(msg))) => {
                    emitter.emit(Event::node(EventKind::NodeFallback, run_id, blueprint_id, node_id));
                    Err(AttemptError::Fatal(msg))
                }
                Some(Err(NodeError::Retryable(_))) | None => Err(exec_err),
            }
        }
    }
}

/// Run the pipeline-level (`config.fallback`) implementation exactly once,
/// with the same inputs, no retries and no further fallback regardless of
/// the implementation's own shape.
async fn run_pipeline_fallback(
    fallback_impl: &Implementation,
    ctx: &dyn AsyncContext,
    inputs: &ActivationInputs,
) -> Result<NodeResult, AttemptError> {
    match fallback_impl {
        Implementation::Function(f) => executor::invoke_function(f.as_ref(), ctx, inputs)
            .await
            .map_err(AttemptError::from),
        Implementation::Structured(node_impl) => {
            let prepped = lifecycle::prep(node_impl.as_ref(), ctx, inputs).await?;
            let result = lifecycle::exec(node_impl.as_ref(), ctx, inputs, prepped).await?;
            let _ = lifecycle::post(node_impl.as_ref(), ctx, inputs, &result).await;
            Ok(result)
        }
    }
}

fn attempt_error_to_engine_error(err: AttemptError, node_id: &str) -> EngineError {
    match err {
        AttemptError::Fatal(message) => EngineError::FatalError { node_id: node_id.to_string(), message },
        AttemptError::Retryable(message) => EngineError::RetryExhausted { node_id: node_id.to_string(), message },
        AttemptError::Timeout(millis) => EngineError::NodeTimeout { node_id: node_id.to_string(), millis },
    }
}

/// Retry loop shared by function-shaped and structured (`exec`-phase)
/// implementations. `attempt` is called up to `max_retries` times; a
/// timeout counts as one attempt, same as an ordinary retryable failure.
#[allow(clippy::too_many_arguments)]
async fn retry_loop<F, Fut>(
    mut attempt: F,
    max_retries: u32,
    retry_delay: Option<Duration>,
    cancellation: &tokio_util::sync::CancellationToken,
    emitter: &dyn EventEmitter,
    run_id: Uuid,
    blueprint_id: &str,
    node_id: &str,
) -> Result<NodeResult, AttemptError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<NodeResult, AttemptError>>,
{
    let mut attempts = 0u32;
    loop {
        if cancellation.is_cancelled() {
            return Err(AttemptError::Retryable("cancelled".to_string()));
        }

        attempts += 1;
        match attempt().await {
            Ok(result) => return Ok(result),
            Err(AttemptError::Fatal(msg)) => return Err(AttemptError::Fatal(msg)),
            Err(non_fatal) => {
                if attempts >= max_retries {
                    return Err(non_fatal);
                }

                emitter.emit(
                    Event::node(EventKind::NodeRetry, run_id, blueprint_id, node_id).with_attempt(attempts),
                );

                if let Some(delay) = retry_delay {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancellation.cancelled() => return Err(AttemptError::Retryable("cancelled".to_string())),
                    }
                }
            }
        }
    }
}
