//! Node-level error type.

use thiserror::Error;

/// Errors a node implementation's `execute`/`exec` method returns.
///
/// The resiliency pipeline in `flowcraft-engine` uses the variant to decide
/// retry behaviour: `Retryable` is re-attempted up to the node's retry
/// budget; `Fatal` bypasses retries and the fallback entirely.
#[derive(Debug, Error, Clone)]
pub enum NodeError {
    #[error("retryable node error: {0}")]
    Retryable(String),

    #[error("fatal node error: {0}")]
    Fatal(String),
}

impl NodeError {
    pub fn message(&self) -> &str {
        match self {
            NodeError::Retryable(m) | NodeError::Fatal(m) => m,
        }
    }
}
