//! Engine-level error types — the runtime representations of spec §7's
//! error kinds.

use thiserror::Error;

use flowcraft_model::ModelError;

/// Errors produced by blueprint validation, graph analysis, the resiliency
/// pipeline, and the local orchestrator.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    /// Blueprint fails validation; fatal to the run.
    #[error("invalid blueprint: {0}")]
    InvalidBlueprint(#[from] ModelError),

    /// Graph analysis found a cycle and the run was started in `strict`
    /// mode; fatal before a single node runs.
    #[error("{0}")]
    CyclicBlueprint(String),

    /// A node's `uses` key has no registered implementation; fatal to the
    /// node and, because unrecoverable, to the run.
    #[error("no implementation registered for '{0}'")]
    ImplementationMissing(String),

    /// Ordinary node failure; eligible for retry and fallback.
    #[error("node '{node_id}' failed: {message}")]
    NodeExecutionError { node_id: String, message: String },

    /// Raised by an implementation (or wrapping `ImplementationMissing`) to
    /// bypass retry/fallback entirely.
    #[error("node '{node_id}' failed fatally: {message}")]
    FatalError { node_id: String, message: String },

    /// A single attempt exceeded its configured timeout; subject to retry.
    #[error("node '{node_id}' timed out after {millis}ms")]
    NodeTimeout { node_id: String, millis: u64 },

    /// Retry budget exhausted and no fallback succeeded.
    #[error("node '{node_id}' exceeded retry limit: {message}")]
    RetryExhausted { node_id: String, message: String },

    /// An edge's `transform` expression raised; halts that edge only.
    #[error("transform on edge into '{target}' failed: {message}")]
    TransformFailed { target: String, message: String },

    /// Cooperative cancellation — not a failure for accounting purposes,
    /// but a distinct terminal condition.
    #[error("run cancelled")]
    Cancelled,

    /// A context operation failed (remote store unreachable, serialization
    /// error, ...).
    #[error("context error: {0}")]
    Context(String),

    /// Middleware raised while wrapping an activation; propagates as the
    /// node's final error, `after` hooks still run.
    #[error("middleware error during node '{node_id}': {message}")]
    Middleware { node_id: String, message: String },
}

impl From<flowcraft_context::ContextError> for EngineError {
    fn from(err: flowcraft_context::ContextError) -> Self {
        EngineError::Context(err.to_string())
    }
}

impl EngineError {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            EngineError::NodeExecutionError { node_id, .. }
            | EngineError::FatalError { node_id, .. }
            | EngineError::NodeTimeout { node_id, .. }
            | EngineError::RetryExhausted { node_id, .. }
            | EngineError::Middleware { node_id, .. } => Some(node_id),
            _ => None,
        }
    }

    /// Whether this error should bypass any remaining retries/fallback,
    /// per spec §7's `FatalError` propagation policy.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::FatalError { .. } | EngineError::ImplementationMissing(_)
        )
    }
}

/// One entry in a run's final error list: `{nodeId, message, originalError?}`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RunError {
    pub node_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
}

impl From<&EngineError> for RunError {
    fn from(err: &EngineError) -> Self {
        RunError {
            node_id: err.node_id().unwrap_or("<blueprint>").to_string(),
            message: err.to_string(),
            original_error: None,
        }
    }
}
