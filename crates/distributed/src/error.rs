//! Distributed-adapter errors — wraps the same engine error kinds (spec §7)
//! plus the adapter's own bookkeeping failures.

use thiserror::Error;

use flowcraft_coordination::CoordinationError;
use flowcraft_engine::EngineError;
use flowcraft_model::ModelError;
use flowcraft_queue::QueueError;

#[derive(Debug, Error)]
pub enum DistributedError {
    #[error("blueprint validation failed: {0}")]
    InvalidBlueprint(#[from] ModelError),

    #[error("unknown blueprint '{0}'")]
    UnknownBlueprint(String),

    #[error("unknown node '{0}' in blueprint")]
    UnknownNode(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Coordination(#[from] CoordinationError),

    #[error("context error: {0}")]
    Context(String),

    #[error("status store error: {0}")]
    Status(String),

    #[error("hook error: {0}")]
    Hook(String),
}

impl From<flowcraft_context::ContextError> for DistributedError {
    fn from(err: flowcraft_context::ContextError) -> Self {
        DistributedError::Context(err.to_string())
    }
}
