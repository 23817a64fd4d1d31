//! The result every node implementation produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A structured error carried on a [`NodeResult`], distinct from the
/// execution-layer error types in `flowcraft-engine` — this is what a node
/// *returns*, not what the pipeline raises around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl StructuredError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            details: None,
        }
    }
}

/// What every `ExecutableNode` / lifecycle implementation returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StructuredError>,
}

impl NodeResult {
    pub fn ok(output: Value) -> Self {
        Self {
            output: Some(output),
            action: None,
            error: None,
        }
    }

    pub fn with_action(output: Value, action: impl Into<String>) -> Self {
        Self {
            output: Some(output),
            action: Some(action.into()),
            error: None,
        }
    }
}
