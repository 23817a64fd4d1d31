//! `MockNode` — a test double for [`crate::ExecutableNode`], used by the
//! engine's orchestrator tests and by any downstream crate's integration
//! tests that need deterministic, DB-free node behaviour.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flowcraft_model::NodeResult;
use serde_json::Value;

use crate::error::NodeError;
use crate::traits::{ExecutableNode, NodeArgs};

/// Behaviour injected into [`MockNode`] at construction time.
pub enum MockBehaviour {
    Return(NodeResult),
    FailRetryable(String),
    FailFatal(String),
}

/// A node that records every input it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    pub name: String,
    pub behaviour: MockBehaviour,
    pub calls: Arc<Mutex<Vec<Value>>>,
}

impl MockNode {
    pub fn returning(name: impl Into<String>, result: NodeResult) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::Return(result),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn returning_output(name: impl Into<String>, output: Value) -> Self {
        Self::returning(name, NodeResult::ok(output))
    }

    pub fn failing_fatal(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::FailFatal(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing_retryable(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::FailRetryable(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(&self, args: NodeArgs<'_>) -> Result<NodeResult, NodeError> {
        self.calls.lock().unwrap().push(args.input);

        match &self.behaviour {
            MockBehaviour::Return(result) => Ok(result.clone()),
            MockBehaviour::FailRetryable(msg) => Err(NodeError::Retryable(msg.clone())),
            MockBehaviour::FailFatal(msg) => Err(NodeError::Fatal(msg.clone())),
        }
    }
}

/// A node that fails the first `fail_times` calls with a retryable error,
/// then succeeds — useful for exercising the retry-then-success path
/// distinct from retry-then-fallback.
pub struct FlakyNode {
    pub name: String,
    pub fail_times: usize,
    pub attempts: Arc<Mutex<usize>>,
    pub success_output: Value,
}

impl FlakyNode {
    pub fn new(name: impl Into<String>, fail_times: usize, success_output: Value) -> Self {
        Self {
            name: name.into(),
            fail_times,
            attempts: Arc::new(Mutex::new(0)),
            success_output,
        }
    }

    pub fn attempt_count(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl ExecutableNode for FlakyNode {
    async fn execute(&self, _args: NodeArgs<'_>) -> Result<NodeResult, NodeError> {
        let mut attempts = self.attempts.lock().unwrap();
        *attempts += 1;
        if *attempts <= self.fail_times {
            Err(NodeError::Retryable(format!("{} flaking (attempt {})", self.name, *attempts)))
        } else {
            Ok(NodeResult::ok(self.success_output.clone()))
        }
    }
}
